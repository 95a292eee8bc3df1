//! GraphQL query definitions for the Shopify Admin API.
//!
//! Each query lives in its own module with `Variables` and `ResponseData`
//! types, and a unit struct implementing [`GraphQLQuery`] ties them to the
//! query document. Required fields are non-optional, so a response missing
//! them fails to decode.

use graphql_client::{GraphQLQuery, QueryBody};

// =============================================================================
// Products
// =============================================================================

/// First page of products with the artwork metafields.
pub struct GetProducts;

pub mod get_products {
    use serde::{Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetProducts";
    pub const QUERY: &str = r#"
query GetProducts($first: Int!) {
  products(first: $first) {
    edges {
      node {
        id
        title
        featuredImage { url }
        priceRangeV2 { minVariantPrice { amount currencyCode } }
        artist: metafield(namespace: "custom", key: "artist") { value }
        year: metafield(namespace: "custom", key: "year") { value }
        dimensions: metafield(namespace: "custom", key: "dimensions") { value }
        medium: metafield(namespace: "custom", key: "medium") { value }
        frame: metafield(namespace: "custom", key: "frame") { value }
      }
    }
  }
}
"#;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: Products,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Products {
        pub edges: Vec<Edge>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Edge {
        pub node: Product,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Product {
        pub id: String,
        pub title: String,
        pub featured_image: Option<Image>,
        pub price_range_v2: PriceRange,
        pub artist: Option<Metafield>,
        pub year: Option<Metafield>,
        pub dimensions: Option<Metafield>,
        pub medium: Option<Metafield>,
        pub frame: Option<Metafield>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Image {
        pub url: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PriceRange {
        pub min_variant_price: Money,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Money {
        pub amount: String,
        pub currency_code: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Metafield {
        pub value: String,
    }
}

impl GraphQLQuery for GetProducts {
    type Variables = get_products::Variables;
    type ResponseData = get_products::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_products::QUERY,
            operation_name: get_products::OPERATION_NAME,
        }
    }
}

// =============================================================================
// Customers
// =============================================================================

/// First page of customers.
pub struct GetCustomers;

pub mod get_customers {
    use serde::{Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCustomers";
    pub const QUERY: &str = r"
query GetCustomers($first: Int!) {
  customers(first: $first) {
    edges {
      node {
        id
        firstName
        lastName
        defaultEmailAddress { emailAddress }
      }
    }
  }
}
";

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub customers: Customers,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Customers {
        pub edges: Vec<Edge>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Edge {
        pub node: Customer,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Customer {
        pub id: String,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub default_email_address: Option<EmailAddress>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EmailAddress {
        pub email_address: Option<String>,
    }
}

impl GraphQLQuery for GetCustomers {
    type Variables = get_customers::Variables;
    type ResponseData = get_customers::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: get_customers::QUERY,
            operation_name: get_customers::OPERATION_NAME,
        }
    }
}
