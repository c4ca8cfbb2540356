//! DOM map of the bill-search portal.
//!
//! The portal is a PrimeNG single-page app. Each interactive element has a
//! primary locator that matches the current markup and looser fallbacks that
//! survive minor markup drift.

use crate::locator::{FallbackLocators, Locator};

/// Bill search page of the Congress portal.
pub const BASE_URL: &str = "https://wb2server.congreso.gob.pe/spley-portal/#/expediente/search";

/// Button that reveals the advanced filter panel.
pub const FILTERS_BUTTON: FallbackLocators = FallbackLocators::new(
    "filters button",
    &[
        Locator::XPath(r#"//button[.//i[contains(@class, "pi-filter")]]"#),
        Locator::XPath(r#"//button[contains(@class, "p-button") and contains(text(), "Filtros")]"#),
        Locator::XPath(r#"//button[@aria-label="Filtros"]"#),
    ],
);

/// "From" date input of the filter panel.
pub const DATE_FROM_INPUT: FallbackLocators = FallbackLocators::new(
    "date-from input",
    &[
        Locator::XPath(r#"//input[@placeholder="Seleccionar desde"]"#),
        Locator::XPath(r#"//input[contains(@id, "desde")]"#),
        Locator::XPath(r#"//input[contains(@name, "desde")]"#),
    ],
);

/// "To" date input of the filter panel.
pub const DATE_TO_INPUT: FallbackLocators = FallbackLocators::new(
    "date-to input",
    &[
        Locator::XPath(r#"//input[@placeholder="Seleccionar hasta"]"#),
        Locator::XPath(r#"//input[contains(@id, "hasta")]"#),
        Locator::XPath(r#"//input[contains(@name, "hasta")]"#),
    ],
);

/// Submit button of the filter panel.
pub const SEARCH_BUTTON: FallbackLocators = FallbackLocators::new(
    "search button",
    &[
        Locator::XPath(
            r#"//button[.//i[contains(@class, "pi-filter")] and .//span[contains(text(), "Buscar")]]"#,
        ),
        Locator::XPath(r#"//button[contains(@class, "p-button") and contains(text(), "Buscar")]"#),
        Locator::XPath(r#"//button[@type="submit"]"#),
    ],
);

/// Paginator "next page" control.
pub const NEXT_PAGE_BUTTON: FallbackLocators = FallbackLocators::new(
    "next page button",
    &[
        Locator::XPath(r#"//button[@class="p-paginator-next p-paginator-element p-link"]"#),
        Locator::XPath(r#"//button[contains(@class, "p-paginator-next")]"#),
    ],
);

/// CSS selector for one result row. Shared by the browser wait and the HTML parser.
pub const RESULT_ROWS_CSS: &str = "tbody.p-datatable-tbody > tr";

/// Result rows of the data table.
pub const RESULT_ROWS: Locator = Locator::Css(RESULT_ROWS_CSS);

/// Minimum number of cells a result row must have.
pub const RESULT_COLUMNS: usize = 6;
