use crate::models::PriceClass;
use bigdecimal::BigDecimal;

/// 价格分类
///
/// 任一价格缺失返回 NA。仅当 segment 名称 (不区分大小写) 含 "TOP" 时,
/// 阈值为 `price_eur * multiplier`, 否则阈值就是 `price_eur`。
pub fn classify_price(
    price: Option<&BigDecimal>,
    price_eur: Option<&BigDecimal>,
    segments_names: Option<&str>,
    multiplier: &BigDecimal,
) -> PriceClass {
    let (Some(price), Some(price_eur)) = (price, price_eur) else {
        return PriceClass::Na;
    };

    let threshold = if is_top_segment(segments_names) {
        price_eur * multiplier
    } else {
        price_eur.clone()
    };

    if *price <= threshold {
        PriceClass::Ok
    } else {
        PriceClass::High
    }
}

fn is_top_segment(segments_names: Option<&str>) -> bool {
    segments_names
        .map(|s| s.to_uppercase().contains("TOP"))
        .unwrap_or(false)
}
