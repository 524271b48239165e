pub mod cart;
pub mod checkout;
pub mod item;
pub mod money;
pub mod price;
pub mod quote;
