use crate::models::scrape::Country;

/// Countries the scrape provider can geo-target.
pub const SUPPORTED_COUNTRIES: &[Country] = &[
    Country { code: "US", name: "United States" },
    Country { code: "GB", name: "United Kingdom" },
    Country { code: "CA", name: "Canada" },
    Country { code: "AU", name: "Australia" },
    Country { code: "DE", name: "Germany" },
    Country { code: "FR", name: "France" },
    Country { code: "IT", name: "Italy" },
    Country { code: "ES", name: "Spain" },
    Country { code: "NL", name: "Netherlands" },
    Country { code: "BE", name: "Belgium" },
    Country { code: "CH", name: "Switzerland" },
    Country { code: "AT", name: "Austria" },
    Country { code: "SE", name: "Sweden" },
    Country { code: "NO", name: "Norway" },
    Country { code: "DK", name: "Denmark" },
    Country { code: "FI", name: "Finland" },
    Country { code: "PL", name: "Poland" },
    Country { code: "IE", name: "Ireland" },
    Country { code: "PT", name: "Portugal" },
    Country { code: "GR", name: "Greece" },
    Country { code: "CZ", name: "Czech Republic" },
    Country { code: "HU", name: "Hungary" },
    Country { code: "RO", name: "Romania" },
    Country { code: "BG", name: "Bulgaria" },
    Country { code: "HR", name: "Croatia" },
    Country { code: "SK", name: "Slovakia" },
    Country { code: "SI", name: "Slovenia" },
    Country { code: "EE", name: "Estonia" },
    Country { code: "LV", name: "Latvia" },
    Country { code: "LT", name: "Lithuania" },
    Country { code: "JP", name: "Japan" },
    Country { code: "CN", name: "China" },
    Country { code: "KR", name: "South Korea" },
    Country { code: "IN", name: "India" },
    Country { code: "SG", name: "Singapore" },
    Country { code: "MY", name: "Malaysia" },
    Country { code: "TH", name: "Thailand" },
    Country { code: "VN", name: "Vietnam" },
    Country { code: "PH", name: "Philippines" },
    Country { code: "ID", name: "Indonesia" },
    Country { code: "NZ", name: "New Zealand" },
    Country { code: "BR", name: "Brazil" },
    Country { code: "MX", name: "Mexico" },
    Country { code: "AR", name: "Argentina" },
    Country { code: "CL", name: "Chile" },
    Country { code: "CO", name: "Colombia" },
    Country { code: "PE", name: "Peru" },
    Country { code: "ZA", name: "South Africa" },
    Country { code: "EG", name: "Egypt" },
    Country { code: "AE", name: "United Arab Emirates" },
    Country { code: "SA", name: "Saudi Arabia" },
    Country { code: "IL", name: "Israel" },
    Country { code: "TR", name: "Turkey" },
    Country { code: "RU", name: "Russia" },
    Country { code: "UA", name: "Ukraine" },
];

/// Normalize a country code to the provider's uppercase form, if supported.
pub fn normalize(code: &str) -> Option<&'static str> {
    let code = code.trim();
    SUPPORTED_COUNTRIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code))
        .map(|c| c.code)
}
