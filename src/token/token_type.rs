//! Token type taxonomy
//!
//! The set of categories a grammar may assign. Names are dotted paths; every refined
//! type has exactly one parent so consumers can test membership with
//! [`TokenType::is_a`] instead of enumerating refinements.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! token_types {
    (@parent $parent:ident) => { Some(TokenType::$parent) };
    (@parent) => { None };
    ($( $variant:ident => $name:literal $(< $parent:ident)? ),+ $(,)?) => {
        /// A token category.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum TokenType {
            $( $variant ),+
        }

        impl TokenType {
            /// All known token types, parents before refinements.
            pub const ALL: &'static [TokenType] = &[ $( TokenType::$variant ),+ ];

            /// Dotted name, e.g. `"Name.Builtin"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( TokenType::$variant => $name ),+
                }
            }

            /// The type this one refines, if any.
            pub fn parent(self) -> Option<TokenType> {
                match self {
                    $( TokenType::$variant => token_types!(@parent $($parent)?) ),+
                }
            }
        }
    };
}

token_types! {
    Text => "Text",
    Whitespace => "Text.Whitespace" < Text,
    Error => "Error",
    Keyword => "Keyword",
    KeywordConstant => "Keyword.Constant" < Keyword,
    KeywordDeclaration => "Keyword.Declaration" < Keyword,
    KeywordNamespace => "Keyword.Namespace" < Keyword,
    KeywordType => "Keyword.Type" < Keyword,
    Operator => "Operator",
    OperatorWord => "Operator.Word" < Operator,
    Punctuation => "Punctuation",
    Name => "Name",
    NameBuiltin => "Name.Builtin" < Name,
    NameVariable => "Name.Variable" < Name,
    NameLabel => "Name.Label" < Name,
    NameConstant => "Name.Constant" < Name,
    NameFunction => "Name.Function" < Name,
    String => "String",
    StringSingle => "String.Single" < String,
    StringDouble => "String.Double" < String,
    StringEscape => "String.Escape" < String,
    StringHeredoc => "String.Heredoc" < String,
    StringBacktick => "String.Backtick" < String,
    StringDoc => "String.Doc" < String,
    Number => "Number",
    Comment => "Comment",
    CommentSingle => "Comment.Single" < Comment,
    CommentMultiline => "Comment.Multiline" < Comment,
    CommentPreproc => "Comment.Preproc" < Comment,
    Generic => "Generic",
    GenericPrompt => "Generic.Prompt" < Generic,
    GenericOutput => "Generic.Output" < Generic,
}

impl TokenType {
    /// True if `self` is `other` or one of its refinements.
    pub fn is_a(self, other: TokenType) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a dotted name that is not part of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTokenType(pub String);

impl fmt::Display for UnknownTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown token type '{}'", self.0)
    }
}

impl std::error::Error for UnknownTokenType {}

impl FromStr for TokenType {
    type Err = UnknownTokenType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Fully qualified names start at the root category "Token"; accept "Token.X" too.
        let name = s.strip_prefix("Token.").unwrap_or(s);
        TokenType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| UnknownTokenType(s.to_string()))
    }
}

impl TryFrom<String> for TokenType {
    type Error = UnknownTokenType;

    fn try_from(value: String) -> Result<Self, UnknownTokenType> {
        value.parse()
    }
}

impl From<TokenType> for String {
    fn from(kind: TokenType) -> Self {
        kind.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_names_round_trip_through_from_str() {
        for kind in TokenType::ALL {
            assert_eq!(kind.as_str().parse::<TokenType>(), Ok(*kind));
        }
    }

    #[test]
    fn test_refinements_are_members_of_their_parent() {
        assert!(TokenType::NameVariable.is_a(TokenType::Name));
        assert!(TokenType::StringHeredoc.is_a(TokenType::String));
        assert!(TokenType::Name.is_a(TokenType::Name));
        assert!(!TokenType::Name.is_a(TokenType::NameVariable));
        assert!(!TokenType::Operator.is_a(TokenType::Punctuation));
    }

    #[test]
    fn test_token_prefix_is_accepted() {
        assert_eq!("Token.Generic.Prompt".parse(), Ok(TokenType::GenericPrompt));
    }

    #[test]
    fn test_unknown_names_are_rejected() {
        let err = "Name.Nope".parse::<TokenType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown token type 'Name.Nope'");
    }

    #[test]
    fn test_try_from_owned_string() {
        assert_eq!(
            TokenType::try_from("Name.Variable".to_string()),
            Ok(TokenType::NameVariable)
        );
        assert_eq!(
            TokenType::try_from("Error".to_string()),
            Ok(TokenType::Error)
        );
        assert!(TokenType::try_from("Bogus".to_string()).is_err());
    }

    #[test]
    fn test_deserializes_from_yaml_string() {
        let kinds: Vec<TokenType> = serde_yaml::from_str("[Keyword, Name.Builtin]").unwrap();
        assert_eq!(kinds, vec![TokenType::Keyword, TokenType::NameBuiltin]);
    }
}
