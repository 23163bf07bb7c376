pub mod alarm;
pub mod appsettings;
pub mod battery;
pub mod occurrence;
pub mod registry;
pub mod reminder;
pub mod scheduler;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
