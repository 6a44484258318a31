pub type Result<I> = std::result::Result<I, crate::error::ParseError>;
