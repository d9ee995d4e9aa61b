pub mod alert;
pub mod confirm;

pub use super::popup::{centered_rect_fixed, draw_popup_frame, render_backdrop};
pub use alert::AlertPopup;
pub use confirm::ConfirmPopup;
