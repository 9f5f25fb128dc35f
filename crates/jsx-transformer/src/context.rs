//! Per-element context: tags, namespaces and the scope chain.

use smol_str::SmolStr;

/// The XML namespace URI that selects the `svg` factory.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
/// The XML namespace URI that selects the `xhtml` factory.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// A namespace that overrides the default `jsx` factory for a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Svg,
    Xhtml,
}

impl Namespace {
    /// Maps an `xmlns` URI to a namespace.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            SVG_NAMESPACE => Some(Self::Svg),
            XHTML_NAMESPACE => Some(Self::Xhtml),
            _ => None,
        }
    }

    /// Maps a tag prefix (`svg:` or `xhtml:`) to a namespace.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "svg" => Some(Self::Svg),
            "xhtml" => Some(Self::Xhtml),
            _ => None,
        }
    }
}

/// A name imported from the runtime module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuntimeName {
    Jsx,
    Svg,
    Xhtml,
    Fragment,
}

impl RuntimeName {
    /// All runtime names in import order.
    pub const ALL: [RuntimeName; 4] = [Self::Jsx, Self::Svg, Self::Xhtml, Self::Fragment];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jsx => "jsx",
            Self::Svg => "svg",
            Self::Xhtml => "xhtml",
            Self::Fragment => "Fragment",
        }
    }

    /// The factory used for elements in `namespace`.
    pub fn factory_for(namespace: Option<Namespace>) -> Self {
        match namespace {
            None => Self::Jsx,
            Some(Namespace::Svg) => Self::Svg,
            Some(Namespace::Xhtml) => Self::Xhtml,
        }
    }
}

/// The first argument of a factory call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// A capitalized identifier naming a component in scope.
    Identifier(SmolStr),
    /// A dotted path such as `Menu.Item`.
    Member(SmolStr),
    /// A built-in element, passed as a string.
    Literal(SmolStr),
}

impl Tag {
    /// Classifies a plain JSX element name.
    pub fn from_name(name: &str) -> Self {
        if is_component_name(name) {
            Self::Identifier(name.into())
        } else {
            Self::Literal(name.into())
        }
    }

    /// Returns true for built-in elements.
    pub fn is_intrinsic(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
        && crate::text::is_identifier(name)
}

/// One level of the element scope chain.
///
/// A frame records only what its element set explicitly; everything else is
/// looked up through `parent`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeFrame<'a> {
    pub parent: Option<&'a ScopeFrame<'a>>,
    pub namespace: Option<Namespace>,
}

impl<'a> ScopeFrame<'a> {
    /// The frame at the top of a file.
    pub fn root() -> Self {
        Self::default()
    }

    /// A child frame, optionally overriding the namespace.
    pub fn child(&'a self, namespace: Option<Namespace>) -> Self {
        Self {
            parent: Some(self),
            namespace,
        }
    }

    /// The nearest namespace set on this frame or an ancestor.
    pub fn namespace(&self) -> Option<Namespace> {
        let mut frame = Some(self);
        while let Some(current) = frame {
            if current.namespace.is_some() {
                return current.namespace;
            }
            frame = current.parent;
        }
        None
    }

    /// The factory for elements created in this frame.
    pub fn factory(&self) -> RuntimeName {
        RuntimeName::factory_for(self.namespace())
    }
}
