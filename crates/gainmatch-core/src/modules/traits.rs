use crate::domain::ChannelInfo;

/// Resolves a physical channel index to its detector segment.
///
/// `None` means the channel is not mapped; callers skip it.
pub trait ChannelMapper {
    fn lookup(&self, channel: usize) -> Option<ChannelInfo>;
}

impl<T> ChannelMapper for &T
where
    T: ChannelMapper + ?Sized,
{
    fn lookup(&self, channel: usize) -> Option<ChannelInfo> {
        (**self).lookup(channel)
    }
}
