pub mod apply;
pub mod channel_map;
pub mod gain;
pub mod mask;
pub mod pipeline;
pub mod scale;
pub mod slopes;
pub mod summary;

mod traits;

pub use traits::ChannelMapper;
