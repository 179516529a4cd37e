//! Domain models backed by the order database.

pub mod branch;
pub mod cart;
pub mod order;
pub mod user;

pub use branch::Branch;
pub use cart::{Cart, CartItem};
pub use order::{Order, OrderItem};
pub use user::User;
