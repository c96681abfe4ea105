//! Schema-less element tree
//!
//! Walks arbitrary BER into a tree of [`Element`]s, keeping the header and
//! wire span of every node. Used for opaque fields (dialogue portions,
//! operation parameters) whose schema the dissector does not know.

use dissect_core::{DecodeConfig, DecodeResult};

use super::cursor::Cursor;
use super::nested::DecodeContext;
use super::types::{Class, Header, Identifier};

/// Content of a decoded element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content<'a> {
    /// Primitive content octets
    Primitive(&'a [u8]),
    /// Child elements of a constructed value
    Constructed(Vec<Element<'a>>),
}

/// One decoded TLV and its wire range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'a> {
    pub header: Header,
    pub content: Content<'a>,
    /// Offset of the first identifier octet
    pub start: usize,
    /// Offset past the last content octet (or End-Of-Contents)
    pub end: usize,
}

impl<'a> Element<'a> {
    pub fn identifier(&self) -> Identifier {
        self.header.identifier
    }

    /// Child elements; empty for primitive elements
    pub fn children(&self) -> &[Element<'a>] {
        match &self.content {
            Content::Constructed(children) => children,
            Content::Primitive(_) => &[],
        }
    }

    /// Content octets of a primitive element
    pub fn primitive(&self) -> Option<&'a [u8]> {
        match self.content {
            Content::Primitive(bytes) => Some(bytes),
            Content::Constructed(_) => None,
        }
    }

    /// First direct child with the given class and tag
    pub fn find(&self, class: Class, tag: u32) -> Option<&Element<'a>> {
        self.children()
            .iter()
            .find(|child| child.identifier().has_tag(class, tag))
    }

    /// Depth of the deepest branch, counting this element as 1
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(Element::depth)
            .max()
            .unwrap_or(0)
    }

    /// Visit this element and every descendant, depth first
    pub fn walk<F: FnMut(&Element<'a>, usize)>(&self, visit: &mut F) {
        self.walk_at(0, visit);
    }

    fn walk_at<F: FnMut(&Element<'a>, usize)>(&self, level: usize, visit: &mut F) {
        visit(self, level);
        for child in self.children() {
            child.walk_at(level + 1, visit);
        }
    }
}

/// Decode one complete element at the cursor
pub fn decode_element<'a>(
    cursor: &mut Cursor<'a>,
    ctx: &mut DecodeContext,
) -> DecodeResult<Element<'a>> {
    let header = cursor.decode_header()?;

    if !header.identifier.constructed {
        let len = header.require_definite()?;
        ctx.check_fits(cursor, &header)?;
        let bytes = cursor.read_octets(len)?;
        return Ok(Element {
            header,
            content: Content::Primitive(bytes),
            start: header.start,
            end: cursor.position(),
        });
    }

    let (children, span) = ctx.within(cursor, header, |ctx, cursor| {
        let mut children = Vec::new();
        while !ctx.at_end(cursor) {
            children.push(decode_element(cursor, ctx)?);
        }
        Ok(children)
    })?;

    Ok(Element {
        header,
        content: Content::Constructed(children),
        start: span.start,
        end: span.end,
    })
}

/// Decode every top-level element of `buffer`
///
/// # Error Handling
/// Fails on the first malformed element, or if octets are left over.
pub fn decode_all(buffer: &[u8], config: DecodeConfig) -> DecodeResult<Vec<Element<'_>>> {
    config.validate()?;
    let mut ctx = DecodeContext::new(config);
    let mut cursor = Cursor::open(buffer);
    let mut elements = Vec::new();
    while !cursor.is_empty() {
        elements.push(decode_element(&mut cursor, &mut ctx)?);
    }
    ctx.finish(&cursor)?;
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::types::universal;
    use dissect_core::DecodeError;
    use hexlit::hex;

    #[test]
    fn test_mixed_tree() {
        // [1] (indefinite) { INTEGER 1, SEQUENCE { OCTET STRING 'AB' }, NULL }
        let data = hex!("A180020101300404024142050000000A0101");
        let elements = decode_all(&data, DecodeConfig::default()).unwrap();
        assert_eq!(elements.len(), 2);

        let root = &elements[0];
        assert_eq!(root.identifier(), Identifier::context_specific(true, 1));
        assert_eq!((root.start, root.end), (0, 15));
        assert_eq!(root.children().len(), 3);
        assert_eq!(root.depth(), 3);

        let sequence = root.find(Class::Universal, universal::SEQUENCE).unwrap();
        assert_eq!((sequence.start, sequence.end), (5, 11));
        assert_eq!(sequence.children()[0].primitive(), Some(&b"AB"[..]));

        let enumerated = &elements[1];
        assert_eq!(enumerated.primitive(), Some(&[0x01][..]));
        assert_eq!((enumerated.start, enumerated.end), (15, 18));
    }

    #[test]
    fn test_walk_visits_in_order() {
        let data = hex!("3080300302010100000500");
        let elements = decode_all(&data, DecodeConfig::default()).unwrap();
        let mut seen = Vec::new();
        for element in &elements {
            element.walk(&mut |e, level| seen.push((e.identifier().tag, level)));
        }
        assert_eq!(
            seen,
            vec![
                (universal::SEQUENCE, 0),
                (universal::SEQUENCE, 1),
                (universal::INTEGER, 2),
                (universal::NULL, 0),
            ]
        );
    }

    #[test]
    fn test_trailing_single_octet() {
        let data = hex!("050000");
        assert!(decode_all(&data, DecodeConfig::default())
            .unwrap_err()
            .is_truncation());
    }

    #[test]
    fn test_depth_limit() {
        let data = hex!("308030803080000000000000");
        let config = DecodeConfig::new().with_max_depth(2);
        assert_eq!(
            decode_all(&data, config),
            Err(DecodeError::NestingTooDeep { limit: 2 })
        );
    }

    #[test]
    fn test_invalid_config() {
        let config = DecodeConfig::new().with_max_depth(0);
        assert!(matches!(
            decode_all(&[], config),
            Err(DecodeError::InvalidConfig(_))
        ));
    }
}
