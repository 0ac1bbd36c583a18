mod utils;

pub(crate) use utils::skip_if_not_available;
