pub mod element;
pub mod events;
pub mod menu_overlay;
pub mod scroll_lock;
