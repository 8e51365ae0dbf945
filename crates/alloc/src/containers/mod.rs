pub(crate) mod into_iter;
pub(crate) mod uninit;
pub(crate) mod vec;
