//! Repository implementations for ThumbHub entities.

pub mod group;
pub mod pixels;
pub mod rendering;
pub mod thumbnail;
pub mod user;

pub use group::GroupRepository;
pub use pixels::PixelsRepository;
pub use rendering::RenderingSettingsRepository;
pub use thumbnail::ThumbnailRepository;
pub use user::UserRepository;
