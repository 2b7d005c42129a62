//! Request-scoped identity and response views.

pub mod session;
pub mod views;

pub use session::{Principal, SESSION_COOKIE_NAME};
pub use views::{OrderLineView, OrderView, RestaurantView, UserProfile, VendorView};
