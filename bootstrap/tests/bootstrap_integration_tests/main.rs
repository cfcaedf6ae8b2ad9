// Licensed under the Apache-2.0 license

mod helpers;

mod test_bootstrap_all;
mod test_bundled_app;
mod test_fatal_errors;
mod test_isolation;
mod test_recovery;
