use super::models::CreateProductRequest;
use crate::common::{ValidationResult, Validator};

impl Validator for CreateProductRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if self.name.trim().is_empty() {
            result.add_error("name", "Product name is required");
        }

        match self.price {
            None => result.add_error("price", "Price is required"),
            Some(price) if price <= 0.0 => {
                result.add_error("price", "Price must be greater than zero")
            }
            Some(_) => {}
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateProductRequest {
        CreateProductRequest {
            name: "Widget".to_string(),
            description: Some("A fine widget".to_string()),
            price: Some(10.5),
            image: None,
            category: Some("tools".to_string()),
        }
    }

    #[test]
    fn test_valid_product_request() {
        assert!(valid_request().validate().is_valid);
    }

    #[test]
    fn test_missing_name() {
        let mut request = valid_request();
        request.name = "  ".to_string();
        let result = request.validate();
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "name"));
    }

    #[test]
    fn test_missing_price() {
        let mut request = valid_request();
        request.price = None;
        assert!(!request.validate().is_valid);
    }

    #[test]
    fn test_non_positive_price() {
        let mut request = valid_request();
        request.price = Some(0.0);
        let result = request.validate();
        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.message.contains("greater than zero")));
    }
}
