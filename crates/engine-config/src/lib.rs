pub mod error;

pub mod report {
    pub mod summary;
}

pub mod settings {
    pub mod connection;
    pub mod env;
    pub mod migration;
    pub mod validator;
}
