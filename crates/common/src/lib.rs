pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health::healthy();
        assert_eq!(h.status, "healthy");
    }
}
