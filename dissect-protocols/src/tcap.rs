//! TCAP (ITU-T Q.773) message structure decoder
//!
//! Decodes the transaction and component layers of a TCAP message:
//! message type, transaction IDs, the dialogue portion span, and each
//! component's invoke ID, operation/error code and parameter span.
//! Operation semantics (what an opcode means, how to decode its
//! parameter) are left to the MAP/CAP layers above.
//!
//! # Structure
//!
//! ```text
//! [APPLICATION 2] Begin            (definite or indefinite)
//!   [APPLICATION 8]  OTID          OCTET STRING (1..4)
//!   [APPLICATION 11] dialogue      skipped, span recorded
//!   [APPLICATION 12] components
//!     [1] Invoke
//!       INTEGER invokeID
//!       [0] IMPLICIT INTEGER linkedID OPTIONAL
//!       INTEGER | OBJECT IDENTIFIER opcode
//!       ANY parameter OPTIONAL
//! ```
//!
//! Every construct may use either length form, mixed freely at any level.

use bytes::Bytes;
use dissect_ber::{
    universal, Class, Cursor, DecodeConfig, DecodeContext, DecodeError, DecodeResult, Decoded,
    Header, ObjectIdentifier,
};

/// Transaction portion tags (APPLICATION class)
pub mod tag {
    pub const UNIDIRECTIONAL: u32 = 1;
    pub const BEGIN: u32 = 2;
    pub const END: u32 = 4;
    pub const CONTINUE: u32 = 5;
    pub const ABORT: u32 = 7;
    pub const OTID: u32 = 8;
    pub const DTID: u32 = 9;
    pub const P_ABORT_CAUSE: u32 = 10;
    pub const DIALOGUE_PORTION: u32 = 11;
    pub const COMPONENT_PORTION: u32 = 12;
}

/// TCAP message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Unidirectional,
    Begin,
    End,
    Continue,
    Abort,
}

impl MessageType {
    pub fn from_tag(number: u32) -> Option<Self> {
        match number {
            tag::UNIDIRECTIONAL => Some(MessageType::Unidirectional),
            tag::BEGIN => Some(MessageType::Begin),
            tag::END => Some(MessageType::End),
            tag::CONTINUE => Some(MessageType::Continue),
            tag::ABORT => Some(MessageType::Abort),
            _ => None,
        }
    }

    pub fn tag(self) -> u32 {
        match self {
            MessageType::Unidirectional => tag::UNIDIRECTIONAL,
            MessageType::Begin => tag::BEGIN,
            MessageType::End => tag::END,
            MessageType::Continue => tag::CONTINUE,
            MessageType::Abort => tag::ABORT,
        }
    }
}

/// Component type, by context-specific tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Invoke,
    ReturnResultLast,
    ReturnError,
    Reject,
    ReturnResultNotLast,
}

impl ComponentType {
    pub fn from_tag(number: u32) -> Option<Self> {
        match number {
            1 => Some(ComponentType::Invoke),
            2 => Some(ComponentType::ReturnResultLast),
            3 => Some(ComponentType::ReturnError),
            4 => Some(ComponentType::Reject),
            7 => Some(ComponentType::ReturnResultNotLast),
            _ => None,
        }
    }
}

/// Invoke ID of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeId {
    Present(i32),
    /// Reject of a component whose invoke ID could not be derived
    NotDerivable,
}

/// Operation or error code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    Local(i32),
    Global(ObjectIdentifier),
}

/// Reject problem class, by context-specific tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    General,
    Invoke,
    ReturnResult,
    ReturnError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Problem {
    pub kind: ProblemKind,
    pub code: i32,
}

/// One decoded component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub component_type: ComponentType,
    pub invoke_id: InvokeId,
    pub linked_id: Option<i32>,
    /// Operation code (Invoke, ReturnResult) or error code (ReturnError)
    pub code: Option<Code>,
    pub problem: Option<Problem>,
    /// Header and span of the parameter, left undecoded
    pub parameter: Option<Decoded<Header>>,
    pub start: usize,
    pub end: usize,
}

impl Component {
    fn new(component_type: ComponentType, invoke_id: InvokeId) -> Self {
        Self {
            component_type,
            invoke_id,
            linked_id: None,
            code: None,
            problem: None,
            parameter: None,
            start: 0,
            end: 0,
        }
    }
}

/// A decoded TCAP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcapMessage {
    pub message_type: MessageType,
    pub otid: Option<Decoded<Bytes>>,
    pub dtid: Option<Decoded<Bytes>>,
    pub abort_cause: Option<i32>,
    /// Header and span of the dialogue portion, left undecoded
    pub dialogue: Option<Decoded<Header>>,
    pub components: Vec<Component>,
    pub start: usize,
    pub end: usize,
}

impl TcapMessage {
    fn new(message_type: MessageType) -> Self {
        Self {
            message_type,
            otid: None,
            dtid: None,
            abort_cause: None,
            dialogue: None,
            components: Vec::new(),
            start: 0,
            end: 0,
        }
    }
}

/// Decode one TCAP message occupying the whole buffer
///
/// # Error Handling
/// Any codec error aborts the message. Unknown transaction-portion
/// elements are skipped.
pub fn decode_tcap(buffer: &[u8], config: DecodeConfig) -> DecodeResult<TcapMessage> {
    config.validate()?;
    let mut cursor = Cursor::open(buffer);
    let mut ctx = DecodeContext::new(config);
    let message = decode_message(&mut cursor, &mut ctx)?;
    ctx.finish(&cursor)?;
    log::debug!(
        "TCAP {:?}: {} component(s), {} octets",
        message.message_type,
        message.components.len(),
        message.end - message.start
    );
    Ok(message)
}

fn decode_message(cursor: &mut Cursor<'_>, ctx: &mut DecodeContext) -> DecodeResult<TcapMessage> {
    let header = cursor.decode_header()?;
    let id = header.identifier;
    let message_type = Some(id)
        .filter(|id| id.class == Class::Application && id.constructed)
        .and_then(|id| MessageType::from_tag(id.tag))
        .ok_or_else(|| header.wrong_type("TCAP message type"))?;

    let (mut message, span) = ctx.within(cursor, header, |ctx, cursor| {
        let mut message = TcapMessage::new(message_type);
        while !ctx.at_end(cursor) {
            let field = cursor.decode_header()?;
            let id = field.identifier;
            match (id.class, id.constructed, id.tag) {
                (Class::Application, false, tag::OTID) => {
                    message.otid = Some(transaction_id(cursor, ctx, &field)?);
                }
                (Class::Application, false, tag::DTID) => {
                    message.dtid = Some(transaction_id(cursor, ctx, &field)?);
                }
                (Class::Application, false, tag::P_ABORT_CAUSE) => {
                    let len = primitive_len(cursor, ctx, &field)?;
                    message.abort_cause = Some(cursor.integer32_value(len)?.into_value());
                }
                (Class::Application, true, tag::DIALOGUE_PORTION) => {
                    message.dialogue = Some(ctx.skip_content(cursor, field)?);
                }
                (Class::Application, true, tag::COMPONENT_PORTION) => {
                    message.components = decode_components(cursor, ctx, field)?;
                }
                _ => {
                    log::debug!("skipping {} in TCAP {:?}", id, message_type);
                    ctx.skip_content(cursor, field)?;
                }
            }
        }
        Ok(message)
    })?;

    message.start = span.start;
    message.end = span.end;
    Ok(message)
}

fn decode_components(
    cursor: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    header: Header,
) -> DecodeResult<Vec<Component>> {
    let (components, _) = ctx.within(cursor, header, |ctx, cursor| {
        let mut components = Vec::new();
        while !ctx.at_end(cursor) {
            components.push(decode_component(cursor, ctx)?);
        }
        Ok(components)
    })?;
    Ok(components)
}

fn decode_component(cursor: &mut Cursor<'_>, ctx: &mut DecodeContext) -> DecodeResult<Component> {
    let header = cursor.decode_header()?;
    let id = header.identifier;
    let component_type = Some(id)
        .filter(|id| id.class == Class::ContextSpecific && id.constructed)
        .and_then(|id| ComponentType::from_tag(id.tag))
        .ok_or_else(|| header.wrong_type("TCAP component"))?;

    let (mut component, span) = ctx.within(cursor, header, |ctx, cursor| {
        let invoke_id = decode_invoke_id(cursor, ctx, component_type)?;
        let mut component = Component::new(component_type, invoke_id);

        match component_type {
            ComponentType::Invoke => {
                if !ctx.at_end(cursor) {
                    let next = cursor.peek_header()?;
                    if next.identifier.is(Class::ContextSpecific, false, 0) {
                        cursor.decode_header()?;
                        let len = primitive_len(cursor, ctx, &next)?;
                        component.linked_id = Some(cursor.integer32_value(len)?.into_value());
                    }
                }
                component.code = Some(decode_code(cursor, ctx)?);
                component.parameter = decode_parameter(cursor, ctx)?;
            }
            ComponentType::ReturnResultLast | ComponentType::ReturnResultNotLast => {
                if !ctx.at_end(cursor) {
                    ctx.open_expected(
                        cursor,
                        Class::Universal,
                        universal::SEQUENCE,
                        "result SEQUENCE",
                    )?;
                    component.code = Some(decode_code(cursor, ctx)?);
                    component.parameter = decode_parameter(cursor, ctx)?;
                    ctx.close(cursor)?;
                }
            }
            ComponentType::ReturnError => {
                component.code = Some(decode_code(cursor, ctx)?);
                component.parameter = decode_parameter(cursor, ctx)?;
            }
            ComponentType::Reject => {
                component.problem = Some(decode_problem(cursor, ctx)?);
            }
        }

        while !ctx.at_end(cursor) {
            let extra = ctx.skip_element(cursor)?;
            log::debug!(
                "skipping trailing {} in {:?}",
                extra.value.identifier,
                component_type
            );
        }
        Ok(component)
    })?;

    component.start = span.start;
    component.end = span.end;
    Ok(component)
}

fn decode_invoke_id(
    cursor: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
    component_type: ComponentType,
) -> DecodeResult<InvokeId> {
    let header = cursor.decode_header()?;
    let id = header.identifier;
    if id.is(Class::Universal, false, universal::INTEGER) {
        let len = primitive_len(cursor, ctx, &header)?;
        return Ok(InvokeId::Present(cursor.integer32_value(len)?.into_value()));
    }
    if component_type == ComponentType::Reject && id.is(Class::Universal, false, universal::NULL) {
        let len = primitive_len(cursor, ctx, &header)?;
        cursor.null_value(len)?;
        return Ok(InvokeId::NotDerivable);
    }
    Err(header.wrong_type("invoke ID"))
}

fn decode_code(cursor: &mut Cursor<'_>, ctx: &mut DecodeContext) -> DecodeResult<Code> {
    let header = cursor.decode_header()?;
    let id = header.identifier;
    if id.is(Class::Universal, false, universal::INTEGER) {
        let len = primitive_len(cursor, ctx, &header)?;
        Ok(Code::Local(cursor.integer32_value(len)?.into_value()))
    } else if id.is(Class::Universal, false, universal::OBJECT_IDENTIFIER) {
        let len = primitive_len(cursor, ctx, &header)?;
        Ok(Code::Global(cursor.object_identifier_value(len)?.into_value()))
    } else {
        Err(header.wrong_type("local or global code"))
    }
}

fn decode_problem(cursor: &mut Cursor<'_>, ctx: &mut DecodeContext) -> DecodeResult<Problem> {
    let header = cursor.decode_header()?;
    let id = header.identifier;
    let kind = match (id.class, id.constructed, id.tag) {
        (Class::ContextSpecific, false, 0) => ProblemKind::General,
        (Class::ContextSpecific, false, 1) => ProblemKind::Invoke,
        (Class::ContextSpecific, false, 2) => ProblemKind::ReturnResult,
        (Class::ContextSpecific, false, 3) => ProblemKind::ReturnError,
        _ => return Err(header.wrong_type("reject problem")),
    };
    let len = primitive_len(cursor, ctx, &header)?;
    let code = cursor.integer32_value(len)?.into_value();
    Ok(Problem { kind, code })
}

fn decode_parameter(
    cursor: &mut Cursor<'_>,
    ctx: &mut DecodeContext,
) -> DecodeResult<Option<Decoded<Header>>> {
    if ctx.at_end(cursor) {
        return Ok(None);
    }
    Ok(Some(ctx.skip_element(cursor)?))
}

fn transaction_id(
    cursor: &mut Cursor<'_>,
    ctx: &DecodeContext,
    header: &Header,
) -> DecodeResult<Decoded<Bytes>> {
    let len = primitive_len(cursor, ctx, header)?;
    if !(1..=4).contains(&len) {
        return Err(DecodeError::WrongLengthForType {
            offset: header.content_start,
            reason: "transaction ID must be 1 to 4 octets",
        });
    }
    let value = cursor.octet_string_value(len)?;
    Ok(Decoded::new(value.value, header.start, value.end))
}

/// Definite length of a primitive field, checked against its enclosing construct
fn primitive_len(cursor: &Cursor<'_>, ctx: &DecodeContext, header: &Header) -> DecodeResult<usize> {
    let len = header.require_definite()?;
    ctx.check_fits(cursor, header)?;
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexlit::hex;

    #[test]
    fn test_begin_indefinite() {
        // Begin { OTID, dialogue { EXTERNAL },
        //   components { invoke 1, opcode 2, SEQUENCE { IMSI } } }, every construct indefinite
        let data = [
            &hex!("6280480401020304")[..],
            &hex!("6B80288006070011860501010100000000")[..],
            &hex!("6C80A180020101020102")[..],
            &hex!("3080040811223344556677F80000")[..],
            &hex!("000000000000")[..],
        ]
        .concat();
        assert_eq!(data.len(), 55);
        let message = decode_tcap(&data, DecodeConfig::default()).unwrap();

        assert_eq!(message.message_type, MessageType::Begin);
        let otid = message.otid.unwrap();
        assert_eq!(&otid.value[..], &[1, 2, 3, 4]);
        assert_eq!((otid.start, otid.end), (2, 8));
        assert!(message.dtid.is_none());

        let dialogue = message.dialogue.unwrap();
        assert_eq!((dialogue.start, dialogue.end), (8, 25));

        assert_eq!(message.components.len(), 1);
        let invoke = &message.components[0];
        assert_eq!(invoke.component_type, ComponentType::Invoke);
        assert_eq!(invoke.invoke_id, InvokeId::Present(1));
        assert_eq!(invoke.code, Some(Code::Local(2)));
        let parameter = invoke.parameter.as_ref().unwrap();
        assert_eq!((parameter.start, parameter.end), (35, 49));
        assert_eq!((invoke.start, invoke.end), (27, 51));
        assert_eq!((message.start, message.end), (0, data.len()));
    }

    #[test]
    fn test_end_definite_return_result() {
        let data = hex!("641649040A0B0C0D6C0EA20C02010130070201020402ABCD");
        let message = decode_tcap(&data, DecodeConfig::default()).unwrap();
        assert_eq!(message.message_type, MessageType::End);
        assert_eq!(&message.dtid.unwrap().value[..], &[0x0A, 0x0B, 0x0C, 0x0D]);

        let result = &message.components[0];
        assert_eq!(result.component_type, ComponentType::ReturnResultLast);
        assert_eq!(result.invoke_id, InvokeId::Present(1));
        assert_eq!(result.code, Some(Code::Local(2)));
        let parameter = result.parameter.as_ref().unwrap();
        assert_eq!((parameter.start, parameter.end), (20, 24));
    }

    #[test]
    fn test_invoke_linked_id_global_opcode() {
        let data = hex!("62164801016C11A10F020105800104060704000001000103");
        let message = decode_tcap(&data, DecodeConfig::default()).unwrap();
        let invoke = &message.components[0];
        assert_eq!(invoke.invoke_id, InvokeId::Present(5));
        assert_eq!(invoke.linked_id, Some(4));
        match &invoke.code {
            Some(Code::Global(oid)) => assert_eq!(oid.to_string(), "0.4.0.0.1.0.1.3"),
            other => panic!("unexpected code {:?}", other),
        }
        assert!(invoke.parameter.is_none());
    }

    #[test]
    fn test_continue_reject_not_derivable() {
        let data = hex!("650F4801014901026C07A4050500800102");
        let message = decode_tcap(&data, DecodeConfig::default()).unwrap();
        assert_eq!(message.message_type, MessageType::Continue);
        assert!(message.otid.is_some() && message.dtid.is_some());
        let reject = &message.components[0];
        assert_eq!(reject.invoke_id, InvokeId::NotDerivable);
        assert_eq!(
            reject.problem,
            Some(Problem {
                kind: ProblemKind::General,
                code: 2
            })
        );
    }

    #[test]
    fn test_p_abort() {
        let data = hex!("67094904010203044A0101");
        let message = decode_tcap(&data, DecodeConfig::default()).unwrap();
        assert_eq!(message.message_type, MessageType::Abort);
        assert_eq!(message.abort_cause, Some(1));
        assert!(message.components.is_empty());
    }

    #[test]
    fn test_message_type_tags() {
        for message_type in [
            MessageType::Unidirectional,
            MessageType::Begin,
            MessageType::End,
            MessageType::Continue,
            MessageType::Abort,
        ] {
            assert_eq!(MessageType::from_tag(message_type.tag()), Some(message_type));
        }
        assert_eq!(MessageType::from_tag(3), None);
        assert_eq!(ComponentType::from_tag(5), None);
    }

    #[test]
    fn test_unknown_message_type() {
        let data = hex!("6303480101");
        assert!(matches!(
            decode_tcap(&data, DecodeConfig::default()),
            Err(DecodeError::WrongType { offset: 0, .. })
        ));
    }

    #[test]
    fn test_transaction_id_too_long() {
        let data = hex!("620748050102030405");
        assert!(matches!(
            decode_tcap(&data, DecodeConfig::default()),
            Err(DecodeError::WrongLengthForType { offset: 4, .. })
        ));
    }

    #[test]
    fn test_truncated_begin() {
        let data = hex!("62804801016C80A180020101020102000000");
        assert!(decode_tcap(&data, DecodeConfig::default())
            .unwrap_err()
            .is_truncation());
    }

    #[test]
    fn test_component_overruns_portion() {
        let data = hex!("620D4801016C06A107020101020102");
        assert!(matches!(
            decode_tcap(&data, DecodeConfig::default()),
            Err(DecodeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_depth_limit_applies() {
        let data = hex!("62804801016C80A180020101020102000000000000");
        assert_eq!(
            decode_tcap(&data, DecodeConfig::new().with_max_depth(2)),
            Err(DecodeError::NestingTooDeep { limit: 2 })
        );
    }
}
