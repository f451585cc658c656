//! Reference diagnostic-dump schema and dump session.
//!
//! The schema models a small crash dump: a system-info section, journal
//! records, and exception data. [`DumpSession`] encodes them with the
//! [`encoder`] crate the way a dump routine drives it: pick a buffer policy,
//! remember the starting depth, encode sections, unwind back to that depth
//! keeping the first error, and finish.

use encoder::{EncodeError, EncodeResult, Encoder, Finished, RequestError};
use schema::{FieldDef, FieldKind, MessageDef, MessageId, Schema, SchemaResult, UntypedField};

pub const NORTHBRIDGE: MessageId = MessageId::new(0);
pub const SYSTEM_INFO: MessageId = MessageId::new(1);
pub const BAD_READ: MessageId = MessageId::new(2);
pub const BUGCHECK: MessageId = MessageId::new(3);
pub const DCL_MSG: MessageId = MessageId::new(4);
pub const EXCEPTION_DATA: MessageId = MessageId::new(5);
pub const NV_DUMP: MessageId = MessageId::new(6);

/// Field numbers of `NvDump`.
pub mod nv_dump {
    pub const SYSTEM_INFO: u32 = 1;
    pub const DCL_MSG: u32 = 2;
    pub const EXCEPTION: u32 = 3;
}

/// Field numbers of `SystemInfo`.
pub mod system_info {
    pub const TIMESTAMP: u32 = 1;
    pub const BUILD_VERSION: u32 = 2;
    pub const BUGCHECK_COUNT: u32 = 3;
    pub const NORTHBRIDGE: u32 = 4;
    pub const GPU_IDS: u32 = 5;
}

/// Field numbers of `Northbridge`.
pub mod northbridge {
    pub const ID: u32 = 1;
    pub const SSID: u32 = 2;
}

/// Field numbers of `BadRead`.
pub mod bad_read {
    pub const MEMORY_SPACE: u32 = 1;
    pub const OFFSET: u32 = 2;
    pub const MASK: u32 = 3;
    pub const VALUE: u32 = 4;
    pub const REASON: u32 = 5;
}

/// Field numbers of `Bugcheck`.
pub mod bugcheck {
    pub const CODE: u32 = 1;
}

/// Field numbers of `DclMsg`.
pub mod dcl_msg {
    pub const JOURNAL_BADREAD: u32 = 1;
    pub const JOURNAL_BUGCHECK: u32 = 2;
    pub const ENGINE_DUMP: u32 = 4;
}

/// Field numbers of `ExceptionData`.
pub mod exception_data {
    pub const SEQUENCE: u32 = 1;
    pub const GPU_ID: u32 = 2;
    pub const TIMESTAMP: u32 = 3;
    pub const CODE: u32 = 4;
    pub const PAYLOAD: u32 = 5;
}

/// Builds the reference dump schema. Message ids match the constants above.
pub fn demo_schema() -> SchemaResult<Schema> {
    let mut builder = Schema::builder();
    builder.add(
        MessageDef::new("Northbridge")
            .field(FieldDef::new("id", northbridge::ID, FieldKind::Uint32))
            .field(FieldDef::new("ssid", northbridge::SSID, FieldKind::Uint32)),
    );
    builder.add(
        MessageDef::new("SystemInfo")
            .field(FieldDef::new(
                "timestamp",
                system_info::TIMESTAMP,
                FieldKind::Uint64,
            ))
            .field(FieldDef::new(
                "build_version",
                system_info::BUILD_VERSION,
                FieldKind::String,
            ))
            .field(FieldDef::new(
                "bugcheck_count",
                system_info::BUGCHECK_COUNT,
                FieldKind::Uint32,
            ))
            .field(FieldDef::message(
                "northbridge",
                system_info::NORTHBRIDGE,
                NORTHBRIDGE,
            ))
            .field(FieldDef::new("gpu_ids", system_info::GPU_IDS, FieldKind::Uint32).packed()),
    );
    builder.add(
        MessageDef::new("BadRead")
            .field(FieldDef::new(
                "memory_space",
                bad_read::MEMORY_SPACE,
                FieldKind::Uint32,
            ))
            .field(FieldDef::new("offset", bad_read::OFFSET, FieldKind::Uint32))
            .field(FieldDef::new("mask", bad_read::MASK, FieldKind::Uint32))
            .field(FieldDef::new("value", bad_read::VALUE, FieldKind::Uint32))
            .field(FieldDef::new("reason", bad_read::REASON, FieldKind::Uint32)),
    );
    builder.add(
        MessageDef::new("Bugcheck").field(FieldDef::new("code", bugcheck::CODE, FieldKind::Uint32)),
    );
    builder.add(
        MessageDef::new("DclMsg")
            .field(FieldDef::message(
                "journal_badread",
                dcl_msg::JOURNAL_BADREAD,
                BAD_READ,
            ))
            .field(FieldDef::message(
                "journal_bugcheck",
                dcl_msg::JOURNAL_BUGCHECK,
                BUGCHECK,
            ))
            .field(FieldDef::new(
                "engine_dump",
                dcl_msg::ENGINE_DUMP,
                FieldKind::Bytes,
            )),
    );
    builder.add(
        MessageDef::new("ExceptionData")
            .field(FieldDef::new(
                "sequence",
                exception_data::SEQUENCE,
                FieldKind::Uint32,
            ))
            .field(FieldDef::new("gpu_id", exception_data::GPU_ID, FieldKind::Uint32))
            .field(FieldDef::new(
                "timestamp",
                exception_data::TIMESTAMP,
                FieldKind::Uint64,
            ))
            .field(FieldDef::new("code", exception_data::CODE, FieldKind::Sint32))
            .field(FieldDef::new(
                "payload",
                exception_data::PAYLOAD,
                FieldKind::Bytes,
            )),
    );
    builder.add(
        MessageDef::new("NvDump")
            .field(FieldDef::message(
                "system_info",
                nv_dump::SYSTEM_INFO,
                SYSTEM_INFO,
            ))
            .field(FieldDef::message("dcl_msg", nv_dump::DCL_MSG, DCL_MSG).repeated())
            .field(FieldDef::message("exception", nv_dump::EXCEPTION, EXCEPTION_DATA).repeated()),
    );
    builder.build()
}

/// Host and platform details written into the system-info section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemInfo {
    pub timestamp: u64,
    pub build_version: String,
    pub bugcheck_count: u32,
    pub northbridge_id: u32,
    pub northbridge_ssid: u32,
    pub gpu_ids: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BadRead {
    pub memory_space: u32,
    pub offset: u32,
    pub mask: u32,
    pub value: u32,
    pub reason: u32,
}

/// One journal entry, encoded as a `DclMsg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalRecord {
    BadRead(BadRead),
    Bugcheck { code: u32 },
    /// Opaque bytes under a field number the schema does not describe.
    Raw { number: u32, bytes: Vec<u8> },
    /// An already-encoded `DclMsg` field, spliced without re-encoding.
    Encoded(Vec<u8>),
}

/// A recorded exception with its assigned sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRecord {
    pub sequence: u32,
    pub gpu_id: u32,
    pub timestamp: u64,
    pub code: i32,
    pub payload: Vec<u8>,
}

/// Which sections a dump contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    SystemInfo,
    /// Journal records and exceptions.
    Journal,
    All,
}

/// Where the dump is written.
#[derive(Debug)]
pub enum BufferPolicy<'b> {
    Provided(&'b mut [u8]),
    Allocate(usize),
    /// Size the dump without storing it, up to the given ceiling.
    Count(usize),
}

/// Outcome of a dump.
///
/// A dump that ran out of room still finishes with well-formed output; the
/// first error hit along the way is kept in `first_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub finished: Finished,
    pub first_error: Option<EncodeError>,
}

impl DumpReport {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.first_error.is_none()
    }
}

/// State collected for a dump.
#[derive(Debug, Clone, Default)]
pub struct DumpSession {
    system: SystemInfo,
    journal: Vec<JournalRecord>,
    exceptions: Vec<ExceptionRecord>,
    error_sequence: u32,
}

impl DumpSession {
    #[must_use]
    pub fn new(system: SystemInfo) -> Self {
        Self {
            system,
            ..Self::default()
        }
    }

    pub fn push_journal(&mut self, record: JournalRecord) {
        self.journal.push(record);
    }

    /// Records an exception and returns its sequence number.
    ///
    /// Sequence numbers start at 1 and are never reused within a session.
    pub fn record_exception(
        &mut self,
        gpu_id: u32,
        timestamp: u64,
        code: i32,
        payload: Vec<u8>,
    ) -> u32 {
        self.error_sequence = self.error_sequence.wrapping_add(1);
        self.exceptions.push(ExceptionRecord {
            sequence: self.error_sequence,
            gpu_id,
            timestamp,
            code,
            payload,
        });
        self.error_sequence
    }

    /// The last sequence number handed out.
    #[must_use]
    pub const fn error_sequence(&self) -> u32 {
        self.error_sequence
    }

    #[must_use]
    pub fn exceptions(&self) -> &[ExceptionRecord] {
        &self.exceptions
    }

    /// Encodes `component` as an `NvDump` message using `policy`.
    pub fn dump_component(
        &self,
        schema: &Schema,
        component: Component,
        policy: BufferPolicy<'_>,
    ) -> EncodeResult<DumpReport> {
        let encoder = match policy {
            BufferPolicy::Provided(buf) => Encoder::start(schema, NV_DUMP, buf)?,
            BufferPolicy::Allocate(capacity) => {
                Encoder::start_allocating(schema, NV_DUMP, capacity)?
            }
            BufferPolicy::Count(ceiling) => Encoder::start_counting(schema, NV_DUMP, ceiling)?,
        };
        self.dump_into(schema, encoder, component)
    }

    /// Encodes `component` with an encoder the caller configured, for
    /// example one with a flush sink installed.
    pub fn dump_into<'s>(
        &self,
        schema: &'s Schema,
        mut enc: Encoder<'s, '_>,
        component: Component,
    ) -> EncodeResult<DumpReport> {
        let starting_depth = enc.current_depth();

        let status = match component {
            Component::SystemInfo => self.encode_system_info(schema, &mut enc),
            Component::Journal => self.encode_journal(schema, &mut enc),
            Component::All => {
                let system = self.encode_system_info(schema, &mut enc);
                system.and(self.encode_journal(schema, &mut enc))
            }
        };
        let status = status.and(enc.unwind_to(starting_depth));

        let finished = match enc.finish() {
            Ok(finished) => finished,
            Err(err) => return Err(status.err().unwrap_or(err)),
        };
        if let Err(err) = &status {
            tracing::warn!(error = %err, bytes = finished.len, "dump truncated");
        } else {
            tracing::debug!(bytes = finished.total_len(), ?component, "dump complete");
        }
        Ok(DumpReport {
            finished,
            first_error: status.err(),
        })
    }

    fn encode_system_info<'s>(
        &self,
        schema: &'s Schema,
        enc: &mut Encoder<'s, '_>,
    ) -> EncodeResult<()> {
        let info = &self.system;
        enc.nested(field(schema, NV_DUMP, nv_dump::SYSTEM_INFO)?, |enc| {
            enc.add_uint64(
                field(schema, SYSTEM_INFO, system_info::TIMESTAMP)?,
                info.timestamp,
            )?;
            enc.add_string(
                field(schema, SYSTEM_INFO, system_info::BUILD_VERSION)?,
                &info.build_version,
            )?;
            enc.add_uint32(
                field(schema, SYSTEM_INFO, system_info::BUGCHECK_COUNT)?,
                info.bugcheck_count,
            )?;
            enc.nested(field(schema, SYSTEM_INFO, system_info::NORTHBRIDGE)?, |enc| {
                enc.add_uint32(field(schema, NORTHBRIDGE, northbridge::ID)?, info.northbridge_id)?;
                enc.add_uint32(
                    field(schema, NORTHBRIDGE, northbridge::SSID)?,
                    info.northbridge_ssid,
                )
            })?;
            let gpu_ids = field(schema, SYSTEM_INFO, system_info::GPU_IDS)?;
            for &id in &info.gpu_ids {
                enc.add_uint32(gpu_ids, id)?;
            }
            Ok(())
        })
    }

    /// Encodes every journal record and exception. A record that fails is
    /// skipped; the first failure is returned once all were attempted.
    fn encode_journal<'s>(&self, schema: &'s Schema, enc: &mut Encoder<'s, '_>) -> EncodeResult<()> {
        let mut status = Ok(());
        for record in &self.journal {
            let result = encode_record(schema, enc, record);
            if let Err(err) = &result {
                tracing::warn!(error = %err, "journal record not encoded");
            }
            status = status.and(result);
        }
        for exception in &self.exceptions {
            let result = encode_exception(schema, enc, exception);
            if let Err(err) = &result {
                tracing::warn!(error = %err, sequence = exception.sequence, "exception not encoded");
            }
            status = status.and(result);
        }
        status
    }
}

fn encode_record<'s>(
    schema: &'s Schema,
    enc: &mut Encoder<'s, '_>,
    record: &JournalRecord,
) -> EncodeResult<()> {
    enc.nested(field(schema, NV_DUMP, nv_dump::DCL_MSG)?, |enc| match record {
        JournalRecord::BadRead(read) => {
            enc.nested(field(schema, DCL_MSG, dcl_msg::JOURNAL_BADREAD)?, |enc| {
                enc.add_uint32(
                    field(schema, BAD_READ, bad_read::MEMORY_SPACE)?,
                    read.memory_space,
                )?;
                enc.add_uint32(field(schema, BAD_READ, bad_read::OFFSET)?, read.offset)?;
                enc.add_uint32(field(schema, BAD_READ, bad_read::MASK)?, read.mask)?;
                enc.add_uint32(field(schema, BAD_READ, bad_read::VALUE)?, read.value)?;
                enc.add_uint32(field(schema, BAD_READ, bad_read::REASON)?, read.reason)
            })
        }
        JournalRecord::Bugcheck { code } => {
            enc.nested(field(schema, DCL_MSG, dcl_msg::JOURNAL_BUGCHECK)?, |enc| {
                enc.add_uint32(field(schema, BUGCHECK, bugcheck::CODE)?, *code)
            })
        }
        JournalRecord::Raw { number, bytes } => {
            enc.add_bytes(UntypedField::new(*number, FieldKind::Bytes), bytes)
        }
        JournalRecord::Encoded(bytes) => enc.concat_encoded_message(bytes),
    })
}

fn encode_exception<'s>(
    schema: &'s Schema,
    enc: &mut Encoder<'s, '_>,
    exception: &ExceptionRecord,
) -> EncodeResult<()> {
    enc.nested(field(schema, NV_DUMP, nv_dump::EXCEPTION)?, |enc| {
        enc.add_uint32(
            field(schema, EXCEPTION_DATA, exception_data::SEQUENCE)?,
            exception.sequence,
        )?;
        enc.add_uint32(
            field(schema, EXCEPTION_DATA, exception_data::GPU_ID)?,
            exception.gpu_id,
        )?;
        enc.add_uint64(
            field(schema, EXCEPTION_DATA, exception_data::TIMESTAMP)?,
            exception.timestamp,
        )?;
        enc.add_int32(
            field(schema, EXCEPTION_DATA, exception_data::CODE)?,
            exception.code,
        )?;
        enc.add_bytes(
            field(schema, EXCEPTION_DATA, exception_data::PAYLOAD)?,
            &exception.payload,
        )
    })
}

fn field(schema: &Schema, message: MessageId, number: u32) -> EncodeResult<&FieldDef> {
    schema
        .message(message)
        .and_then(|def| def.by_number(number))
        .ok_or_else(|| RequestError::UnknownField { number }.into())
}
