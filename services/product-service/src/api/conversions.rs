//! 领域对象与 proto 消息的转换

use chrono::{DateTime, Utc};

use crate::domain::ProductDetails;
use crate::product::v1 as pb;

pub fn to_timestamp(at: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}

impl From<ProductDetails> for pb::Product {
    fn from(details: ProductDetails) -> Self {
        let ProductDetails {
            product,
            category_name,
        } = details;
        Self {
            id: product.id,
            name: product.name,
            category_id: product.category_id,
            category_name,
            created_at: Some(to_timestamp(product.created_at)),
        }
    }
}
