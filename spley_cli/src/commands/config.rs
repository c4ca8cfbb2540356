use spley_lib::ScraperConfig;

use crate::output::print_json;

pub fn run(config: &ScraperConfig) {
    print_json(config);
}
