pub mod form;
pub mod html;
pub mod relay;
pub mod submission;
pub mod transport;
