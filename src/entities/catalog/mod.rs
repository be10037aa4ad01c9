pub mod brand;
pub mod category;
pub mod price_history;
pub mod product;
pub mod product_document;
pub mod product_image;
pub mod product_variant;
pub mod promotion;
pub mod promotion_code;
