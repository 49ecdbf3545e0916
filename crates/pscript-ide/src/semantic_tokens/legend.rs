//! Token types and modifiers, and their positions in a client legend.

use lsp_types::{SemanticTokenModifier, SemanticTokenType, SemanticTokensLegend};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Namespace,
    Class,
    Enum,
    Interface,
    Struct,
    Type,
    Parameter,
    Variable,
    Property,
    EnumMember,
    Function,
    Method,
    String,
    Number,
}

impl TokenKind {
    pub const ALL: [TokenKind; 14] = [
        TokenKind::Namespace,
        TokenKind::Class,
        TokenKind::Enum,
        TokenKind::Interface,
        TokenKind::Struct,
        TokenKind::Type,
        TokenKind::Parameter,
        TokenKind::Variable,
        TokenKind::Property,
        TokenKind::EnumMember,
        TokenKind::Function,
        TokenKind::Method,
        TokenKind::String,
        TokenKind::Number,
    ];

    pub fn lsp(self) -> SemanticTokenType {
        match self {
            TokenKind::Namespace => SemanticTokenType::NAMESPACE,
            TokenKind::Class => SemanticTokenType::CLASS,
            TokenKind::Enum => SemanticTokenType::ENUM,
            TokenKind::Interface => SemanticTokenType::INTERFACE,
            TokenKind::Struct => SemanticTokenType::STRUCT,
            TokenKind::Type => SemanticTokenType::TYPE,
            TokenKind::Parameter => SemanticTokenType::PARAMETER,
            TokenKind::Variable => SemanticTokenType::VARIABLE,
            TokenKind::Property => SemanticTokenType::PROPERTY,
            TokenKind::EnumMember => SemanticTokenType::ENUM_MEMBER,
            TokenKind::Function => SemanticTokenType::FUNCTION,
            TokenKind::Method => SemanticTokenType::METHOD,
            TokenKind::String => SemanticTokenType::STRING,
            TokenKind::Number => SemanticTokenType::NUMBER,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Modifier {
    Declaration,
    Readonly,
    Static,
    Abstract,
    DefaultLibrary,
}

impl Modifier {
    pub const ALL: [Modifier; 5] = [
        Modifier::Declaration,
        Modifier::Readonly,
        Modifier::Static,
        Modifier::Abstract,
        Modifier::DefaultLibrary,
    ];

    pub fn lsp(self) -> SemanticTokenModifier {
        match self {
            Modifier::Declaration => SemanticTokenModifier::DECLARATION,
            Modifier::Readonly => SemanticTokenModifier::READONLY,
            Modifier::Static => SemanticTokenModifier::STATIC,
            Modifier::Abstract => SemanticTokenModifier::ABSTRACT,
            Modifier::DefaultLibrary => SemanticTokenModifier::DEFAULT_LIBRARY,
        }
    }
}

/// A set of [`Modifier`]s, independent of any legend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);

    pub fn with(self, modifier: Modifier) -> Self {
        Modifiers(self.0 | 1 << modifier as u8)
    }

    pub fn with_if(self, modifier: Modifier, condition: bool) -> Self {
        if condition { self.with(modifier) } else { self }
    }

    pub fn contains(self, modifier: Modifier) -> bool {
        self.0 & (1 << modifier as u8) != 0
    }
}

/// The token type and modifier lists a client and server agreed on.
#[derive(Clone, Debug, PartialEq)]
pub struct Legend {
    types: Vec<SemanticTokenType>,
    modifiers: Vec<SemanticTokenModifier>,
}

impl Default for Legend {
    fn default() -> Self {
        Self::standard()
    }
}

impl Legend {
    /// Every kind and modifier, in declaration order.
    pub fn standard() -> Self {
        Self {
            types: TokenKind::ALL.iter().map(|k| k.lsp()).collect(),
            modifiers: Modifier::ALL.iter().map(|m| m.lsp()).collect(),
        }
    }

    pub fn from_lsp(legend: &SemanticTokensLegend) -> Self {
        Self {
            types: legend.token_types.clone(),
            modifiers: legend.token_modifiers.clone(),
        }
    }

    pub fn to_lsp(&self) -> SemanticTokensLegend {
        SemanticTokensLegend {
            token_types: self.types.clone(),
            token_modifiers: self.modifiers.clone(),
        }
    }

    /// Index of `kind`, or `None` when the legend does not carry it.
    pub fn type_index(&self, kind: TokenKind) -> Option<u32> {
        let wanted = kind.lsp();
        self.types
            .iter()
            .position(|t| *t == wanted)
            .map(|i| i as u32)
    }

    /// Bitmask of `modifiers` in this legend's modifier order. Modifiers the
    /// legend lacks are dropped.
    pub fn modifier_bits(&self, modifiers: Modifiers) -> u32 {
        Modifier::ALL
            .iter()
            .filter(|m| modifiers.contains(**m))
            .filter_map(|m| {
                let wanted = m.lsp();
                self.modifiers.iter().position(|x| *x == wanted)
            })
            // Only the first 32 legend entries fit in the bitset.
            .filter(|&i| i < 32)
            .fold(0, |bits, i| bits | 1 << i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_legend_indices() {
        let legend = Legend::standard();
        assert_eq!(legend.type_index(TokenKind::Namespace), Some(0));
        assert_eq!(legend.type_index(TokenKind::Number), Some(13));
        let mods = Modifiers::NONE
            .with(Modifier::Declaration)
            .with(Modifier::Static);
        assert_eq!(legend.modifier_bits(mods), 0b101);
    }

    #[test]
    fn test_custom_legend_remaps_and_drops() {
        let legend = Legend::from_lsp(&SemanticTokensLegend {
            token_types: vec![SemanticTokenType::VARIABLE, SemanticTokenType::CLASS],
            token_modifiers: vec![SemanticTokenModifier::STATIC],
        });
        assert_eq!(legend.type_index(TokenKind::Class), Some(1));
        assert_eq!(legend.type_index(TokenKind::Function), None);
        let mods = Modifiers::NONE
            .with(Modifier::Declaration)
            .with(Modifier::Static);
        assert_eq!(legend.modifier_bits(mods), 0b1);
    }

    #[test]
    fn test_modifiers_past_bit_32_are_dropped() {
        let mut token_modifiers: Vec<SemanticTokenModifier> = (0..40)
            .map(|i| SemanticTokenModifier::from(format!("custom{i}")))
            .collect();
        token_modifiers[3] = SemanticTokenModifier::READONLY;
        token_modifiers.push(SemanticTokenModifier::STATIC);
        let legend = Legend::from_lsp(&SemanticTokensLegend {
            token_types: vec![SemanticTokenType::VARIABLE],
            token_modifiers,
        });
        let mods = Modifiers::NONE
            .with(Modifier::Readonly)
            .with(Modifier::Static);
        assert_eq!(legend.modifier_bits(mods), 1 << 3);
    }
}
