//! Order payload construction

use recreviews_common::time::format_order_date;
use recreviews_domain::{CustomerBlock, Order, OrderBlock, OrderPayload, ProductLine};

/// Build the `api/orders` body for `order`.
///
/// Line images fall back to `placeholder_image`, then to an empty string.
pub fn build_order_payload(order: &Order, lang: &str, placeholder_image: Option<&str>) -> OrderPayload {
    let products = order
        .lines
        .iter()
        .map(|line| ProductLine {
            id: line.product_id,
            name: line.name.clone(),
            image: line
                .image_url
                .as_deref()
                .filter(|url| !url.is_empty())
                .or(placeholder_image)
                .unwrap_or_default()
                .to_string(),
            price: line.price.clone(),
            currency: order.currency.clone(),
        })
        .collect();

    OrderPayload {
        order: OrderBlock {
            reference: order.id.to_string(),
            order_date: format_order_date(order.created_at),
            products,
        },
        customer: CustomerBlock {
            id: order.customer.id,
            first_name: order.customer.first_name.clone(),
            last_name: order.customer.last_name.clone(),
            email: order.customer.email.clone(),
            phone: order.customer.phone.clone(),
            lang: lang.to_string(),
            gender: None,
            birthdate: None,
        },
    }
}

/// First two characters of a locale or `Accept-Language` value.
pub fn language_prefix(value: &str) -> Option<String> {
    let prefix: String = value.trim().chars().take(2).collect();
    (!prefix.is_empty()).then_some(prefix)
}
