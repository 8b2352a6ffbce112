const DB_DRIVER: &str = "FACETTE_DB_DRIVER";

const DEFAULT_DRIVER: &str = "sqlite";

pub fn get_driver() -> String {
    std::env::var(DB_DRIVER).unwrap_or_else(|_| DEFAULT_DRIVER.to_string())
}

const DB_TARGET: &str = "FACETTE_DB_TARGET";

const DEFAULT_TARGET: &str = "./facette.db";

pub fn get_target() -> String {
    std::env::var(DB_TARGET).unwrap_or_else(|_| DEFAULT_TARGET.to_string())
}
