//! The API endpoints URIs.
//!
//! For endpoints that take parameters, e.g., '/transactions/{transaction_id}', use `format_endpoint` in tests.

/// The route to create and list transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The route to add line items to a transaction.
pub const TRANSACTION_DETAILS: &str = "/transactions/{transaction_id}/details";
/// The route to remove a single line item.
pub const TRANSACTION_DETAIL: &str = "/transactions/{transaction_id}/details/{detail_id}";
/// The route to look up a product by its code.
pub const PRODUCT_BY_CODE: &str = "/products-by-code/{code}";

/// Replace the parameters in `endpoint_path` with `values`, in order.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/transactions/{transaction_id}', '{transaction_id}' is the parameter.
///
/// Parameters without a matching value are left as is, and extra values are ignored.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, values: &[&dyn ToString]) -> String {
    let mut formatted = String::with_capacity(endpoint_path.len());
    let mut values = values.iter();
    let mut rest = endpoint_path;

    while let Some(param_start) = rest.find('{') {
        let Some(param_len) = rest[param_start..].find('}') else {
            break;
        };
        let param_end = param_start + param_len + 1;

        formatted.push_str(&rest[..param_start]);
        match values.next() {
            Some(value) => formatted.push_str(&value.to_string()),
            None => formatted.push_str(&rest[param_start..param_end]),
        }

        rest = &rest[param_end..];
    }

    formatted.push_str(rest);
    formatted
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION_DETAILS);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION_DETAIL);
        assert_endpoint_is_valid_uri(endpoints::PRODUCT_BY_CODE);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint(endpoints::TRANSACTION, &[&1]);

        assert_eq!(formatted_path, "/transactions/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn replaces_parameters_in_order() {
        let formatted_path = format_endpoint(endpoints::TRANSACTION_DETAIL, &[&12, &3]);

        assert_eq!(formatted_path, "/transactions/12/details/3");
    }

    #[test]
    fn accepts_string_values() {
        let formatted_path = format_endpoint(endpoints::PRODUCT_BY_CODE, &[&"4901234567894"]);

        assert_eq!(formatted_path, "/products-by-code/4901234567894");
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", &[&1]);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn leaves_parameters_without_values() {
        let formatted_path = format_endpoint(endpoints::TRANSACTION_DETAIL, &[&12]);

        assert_eq!(formatted_path, "/transactions/12/details/{detail_id}");
    }
}
