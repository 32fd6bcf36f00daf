pub mod core {
    pub mod identifiers;
    pub mod value;
}

pub mod execution {
    pub mod errors;
    pub mod failed_row;
    pub mod work_item;
}

pub mod records {
    pub mod operation;
    pub mod transaction;
}

pub mod transform {
    pub mod mapping;
}
