mod record;

pub use record::SecurityRecord;
