//! Conversions from GraphQL response types to domain types.

use showroom_core::{Customer, ProductSnapshot};

use super::queries::{get_customers, get_products};

pub fn convert_product(product: get_products::Product) -> ProductSnapshot {
    let money = product.price_range_v2.min_variant_price;

    ProductSnapshot {
        id: product.id,
        title: product.title,
        image_url: product.featured_image.map(|i| i.url),
        price: Some(format!("{} {}", money.amount, money.currency_code)),
        artist: metafield_value(product.artist),
        year: metafield_value(product.year),
        dimensions: metafield_value(product.dimensions),
        medium: metafield_value(product.medium),
        frame: metafield_value(product.frame),
    }
}

pub fn convert_product_connection(data: get_products::ResponseData) -> Vec<ProductSnapshot> {
    data.products
        .edges
        .into_iter()
        .map(|e| convert_product(e.node))
        .collect()
}

pub fn convert_customer(customer: get_customers::Customer) -> Customer {
    Customer {
        id: customer.id,
        email: customer
            .default_email_address
            .and_then(|e| e.email_address)
            .unwrap_or_default(),
        first_name: customer.first_name,
        last_name: customer.last_name,
    }
}

pub fn convert_customer_connection(data: get_customers::ResponseData) -> Vec<Customer> {
    data.customers
        .edges
        .into_iter()
        .map(|e| convert_customer(e.node))
        .collect()
}

/// Blank metafields count as absent.
fn metafield_value(field: Option<get_products::Metafield>) -> Option<String> {
    field.map(|f| f.value).filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_product_connection() {
        let json = r#"{
            "products": {"edges": [{"node": {
                "id": "gid://shopify/Product/7",
                "title": "Harbour at Dusk",
                "featuredImage": {"url": "https://cdn.shopify.com/harbour.jpg"},
                "priceRangeV2": {"minVariantPrice": {"amount": "1200.0", "currencyCode": "EUR"}},
                "artist": {"value": "A. Moreau"},
                "year": {"value": "1998"},
                "dimensions": null,
                "medium": {"value": "  "},
                "frame": null
            }}]}
        }"#;
        let data: get_products::ResponseData = serde_json::from_str(json).unwrap();
        let products = convert_product_connection(data);

        assert_eq!(products.len(), 1);
        let p = &products[0];
        assert_eq!(p.title, "Harbour at Dusk");
        assert_eq!(p.price.as_deref(), Some("1200.0 EUR"));
        assert_eq!(p.image_url.as_deref(), Some("https://cdn.shopify.com/harbour.jpg"));
        assert_eq!(p.artist.as_deref(), Some("A. Moreau"));
        assert_eq!(p.medium, None);
        assert_eq!(p.dimensions, None);
    }

    #[test]
    fn test_convert_customer_without_email() {
        let customer = convert_customer(get_customers::Customer {
            id: "gid://shopify/Customer/1".to_string(),
            first_name: Some("Ines".to_string()),
            last_name: None,
            default_email_address: None,
        });
        assert_eq!(customer.email, "");
        assert_eq!(customer.display_name(), "Ines");
    }
}
