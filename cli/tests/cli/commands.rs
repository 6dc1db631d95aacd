pub(crate) mod decode;
pub(crate) mod info;
pub(crate) mod select;
