pub mod car;
pub mod controller;
pub mod driver;
pub mod race_data;
pub mod roster;
pub mod tireset;
pub mod track;
