//! Core domain types.

pub mod cart;
pub mod id;
pub mod menu;
pub mod money;
pub mod notification;
pub mod order;
pub mod payment;

pub use cart::*;
pub use id::*;
pub use menu::*;
pub use money::*;
pub use notification::*;
pub use order::*;
pub use payment::*;
