pub mod contacts;
pub mod messages;
pub mod transactions;
pub mod users;

pub use contacts::Contact;
pub use messages::Message;
pub use transactions::{Crop, Transaction};
pub use users::{NewUser, User, UserType};
