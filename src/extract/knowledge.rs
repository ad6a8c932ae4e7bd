//! Known-good price selectors per storefront.
//!
//! Each entry is ordered most-specific-first. Storefronts without an entry fall
//! back to [`COMMON_LOCATORS`].
//!
//! **Update process**: when a storefront redesign breaks extraction, capture the
//! product page HTML, put the new selector at the top of its list and add a
//! fixture test.

use crate::extract::models::Domain;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Storefront hostname -> ordered CSS selectors.
static STOREFRONTS: &[(&str, &[&str])] = &[
    (
        "amazon.com.br",
        &[
            "#corePrice_feature_div .a-price .a-offscreen",
            "#corePriceDisplay_desktop_feature_div .a-price .a-offscreen",
            "#priceblock_ourprice",
            "#priceblock_dealprice",
            "#price_inside_buybox",
            ".a-price .a-offscreen",
        ],
    ),
    (
        "mercadolivre.com.br",
        &[
            ".ui-pdp-price__second-line .andes-money-amount__fraction",
            ".ui-pdp-price__second-line [itemprop='price']",
            "meta[itemprop='price']",
            ".andes-money-amount--cents-superscript .andes-money-amount__fraction",
            ".price-tag-fraction",
        ],
    ),
    (
        "magazineluiza.com.br",
        &[
            "[data-testid='price-value']",
            "[data-testid='price-original']",
            ".price-template__text",
            ".p-price strong",
        ],
    ),
    (
        "americanas.com.br",
        &[
            "[data-testid='price-value']",
            ".priceSales",
            ".src__BestPrice-sc-1jnodg3-5",
            ".sales-price",
        ],
    ),
    ("submarino.com.br", &["[data-testid='price-value']", ".priceSales", ".sales-price"]),
    ("shoptime.com.br", &["[data-testid='price-value']", ".priceSales", ".sales-price"]),
    (
        "casasbahia.com.br",
        &[
            "#product-price",
            "[data-testid='product-price-value']",
            ".product-price-value",
            ".sales-price",
        ],
    ),
    (
        "pontofrio.com.br",
        &["#product-price", "[data-testid='product-price-value']", ".product-price-value"],
    ),
    ("extra.com.br", &["#product-price", "[data-testid='product-price-value']", ".sales-price"]),
    (
        "kabum.com.br",
        &[
            "h4.finalPrice",
            ".finalPrice",
            "#blocoValores h4",
            "[class*='priceCard']",
            ".preco_desconto strong",
        ],
    ),
    (
        "pichau.com.br",
        &["[data-cy='product-price']", ".jss269", "div[class*='price_vista']"],
    ),
    (
        "terabyteshop.com.br",
        &["#valVista", ".valVista", "#prod-new-price span", ".prod-new-price"],
    ),
    ("fastshop.com.br", &["[data-testid='price-value']", ".price-fraction", ".price-value"]),
    ("carrefour.com.br", &["[data-testid='price-value']", ".vtex-product-price-1-x-sellingPriceValue"]),
    (
        "netshoes.com.br",
        &["[data-price-type='finalPrice'] .price-value", ".default-price strong", ".price__list"],
    ),
    ("centauro.com.br", &["[data-testid='price-current']", ".Price-module__price", ".price"]),
    ("dafiti.com.br", &[".catalog-detail-price-value", "[data-field='finalPrice']"]),
    ("zattini.com.br", &["[data-price-type='finalPrice'] .price-value", ".default-price strong"]),
    (
        "shopee.com.br",
        &["div[class*='pqTWkA']", "div.IZPeQz", "section[aria-live='polite'] div[class*='price']"],
    ),
    (
        "aliexpress.com",
        &[".product-price-current", "[class*='price--current']", ".uniform-banner-box-price"],
    ),
    ("leroymerlin.com.br", &["[data-testid='price-value']", ".price-integer", ".product-price"]),
    (
        "madeiramadeira.com.br",
        &["[data-testid='price-value']", "[data-testid='price']", ".cav--c-gNPphv"],
    ),
    (
        "drogasil.com.br",
        &["[data-testid='price']", ".price-final", "[class*='price_final']"],
    ),
    ("drogaraia.com.br", &["[data-testid='price']", ".price-final", "[class*='price_final']"]),
    ("boticario.com.br", &[".nproduct-price-value", ".product-price-value"]),
    ("natura.com.br", &["[data-testid='product-price']", ".product-price__value"]),
    ("sephora.com.br", &[".product-price .price-sales", ".price-sales"]),
    ("epocacosmeticos.com.br", &[".vtex-product-price-1-x-sellingPriceValue", ".skuBestPrice"]),
    ("renner.com.br", &["[data-testid='product-price']", ".ProductPrice_price__"]),
    ("riachuelo.com.br", &["[data-testid='price-sale']", ".price-sale", ".product-price"]),
    ("cea.com.br", &[".vtex-product-price-1-x-sellingPriceValue", ".product-price"]),
    ("havan.com.br", &[".price-box .price", "[data-price-type='finalPrice'] .price"]),
    ("colombo.com.br", &[".preco-produto .valor", ".produto-preco .preco-por"]),
    ("nike.com.br", &["[data-testid='currentPrice-container']", ".ProductPrice-styled__Price"]),
    ("adidas.com.br", &[".gl-price-item--sale", ".gl-price-item"]),
    ("samsung.com", &[".pd-buying-price__new-price", ".price-info__current"]),
    ("apple.com", &[".rc-prices-fullprice", "[data-autom='full-price']"]),
    ("dell.com", &["[data-testid='sharedPSPDellPrice']", ".ps-dell-price"]),
    ("lenovo.com", &[".final-price", ".price-title"]),
    ("girafa.com.br", &[".preco-avista", ".price-boleto"]),
];

/// Cross-storefront fallback selectors, attribute-based first, then class and id heuristics.
pub static COMMON_LOCATORS: &[&str] = &[
    "[itemprop='price']",
    "meta[property='product:price:amount']",
    "[data-testid='price-value']",
    "[data-testid='product-price']",
    ".vtex-product-price-1-x-sellingPriceValue",
    ".vtex-product-price-1-x-currencyContainer",
    ".skuBestPrice",
    ".woocommerce-Price-amount",
    ".price ins .amount",
    ".summary .price .amount",
    ".product-info-main .price-wrapper .price",
    ".price-box .special-price .price",
    ".price-box .price",
    ".special-price",
    ".sale-price",
    ".selling-price",
    ".current-price",
    ".final-price",
    ".best-price",
    ".price-current",
    ".price-final",
    ".price-sales",
    ".product-price",
    ".product__price",
    ".product-price-value",
    ".preco-por",
    ".preco-avista",
    ".preco-produto",
    ".preco",
    ".valor-por",
    ".valor",
    ".price-value",
    ".price",
    "[class*='sellingPrice']",
    "[class*='salePrice']",
    "[class*='bestPrice']",
    "[class*='finalPrice']",
    "[class*='productPrice']",
    "[class*='ProductPrice']",
    "[class*='price-value']",
    "[class*='preco']",
    "[class*='Preco']",
    "[class*='price']",
    "[class*='Price']",
    "[id*='price']",
    "[id*='Price']",
    "[id*='preco']",
];

static INDEX: LazyLock<HashMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| STOREFRONTS.iter().copied().collect());

/// Selectors dedicated to this storefront, matching the host or any parent suffix.
pub fn domain_locators(domain: &Domain) -> Option<&'static [&'static str]> {
    domain.candidates().find_map(|candidate| INDEX.get(candidate).copied())
}

/// Storefront selectors when known, the common list otherwise.
pub fn known_locators(domain: &Domain) -> &'static [&'static str] {
    domain_locators(domain).unwrap_or(COMMON_LOCATORS)
}

/// Every storefront with a dedicated entry, in table order.
pub fn storefronts() -> impl Iterator<Item = (&'static str, usize)> {
    STOREFRONTS.iter().map(|(host, selectors)| (*host, selectors.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_selectors_compile() {
        for (host, selectors) in STOREFRONTS {
            for selector in *selectors {
                assert!(Selector::parse(selector).is_ok(), "{host}: {selector}");
            }
        }

        for selector in COMMON_LOCATORS {
            assert!(Selector::parse(selector).is_ok(), "common: {selector}");
        }
    }

    #[test]
    fn test_no_duplicate_storefronts() {
        assert_eq!(INDEX.len(), STOREFRONTS.len());
    }

    #[test]
    fn test_lookup_by_subdomain() {
        let domain = Domain::new("produto.mercadolivre.com.br");
        let selectors = domain_locators(&domain).unwrap();
        assert!(selectors[0].contains("ui-pdp-price"));

        let domain = Domain::new("www.kabum.com.br");
        assert_eq!(domain_locators(&domain).unwrap()[0], "h4.finalPrice");
    }

    #[test]
    fn test_unknown_domain_falls_back() {
        let domain = Domain::new("loja-exemplo.com.br");
        assert!(domain_locators(&domain).is_none());
        assert_eq!(known_locators(&domain), COMMON_LOCATORS);
    }

    #[test]
    fn test_storefront_listing() {
        let listed: Vec<_> = storefronts().collect();
        assert!(listed.len() >= 30);
        assert!(listed.iter().any(|(host, _)| *host == "amazon.com.br"));
        assert!(listed.iter().all(|(_, count)| *count > 0));
    }
}
