pub mod error;

pub mod sql {
    pub mod base {
        pub mod destination;
        pub mod error;
        pub mod source;
        pub mod table;

        pub mod query {
            pub mod generator;
        }
    }

    pub mod postgres {
        pub mod client;
        pub mod destination;
        pub mod params;
        pub mod row;
        pub mod source;
        pub mod utils;
    }
}
