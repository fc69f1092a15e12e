use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Reserved words of the rule language.
///
/// Keywords are recognized from identifiers (see
/// [`parse_identifier`](super::token::parse_identifier)) so that names such
/// as `android` or `notice` are never split into a keyword prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    And,
    Or,
    Not,
    When,
}
