//! # Node kinds
//!
//! Every parse-tree node is tagged with a [`NodeKind`]. Production kinds correspond to the
//! grammar constructs the semantic pass reacts to; terminal kinds (`Identifier`,
//! `Keyword`, `Datatype`, ...) are leaves whose meaning depends on their parent.

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Compilation units
    Program,
    ClassStatement,
    InterfaceStatement,
    /// Any statement without resolution semantics of its own
    Statement,

    // Control blocks
    DoBlock,
    ForBlock,
    RepeatBlock,
    BlockFor,
    BlockIterator,
    BlockWhile,
    BlockPreselect,

    // Routines and scope-introducing blocks
    ProcedureStatement,
    FunctionStatement,
    MethodStatement,
    ConstructorStatement,
    DestructorStatement,
    PropertyAccessor,
    OnStatement,
    CatchBlock,

    // Definitions
    DefineVariable,
    DefineParameter,
    DefineProperty,
    DefineTempTable,
    DefineWorkTable,
    DefineBuffer,
    DefineEvent,
    DefineBrowse,
    DefineWidget(WidgetKind),
    FunctionParameter,
    BufferParameter,
    TableParameter,
    AsClause,
    LikeClause,
    ExtentClause,
    ReturnsClause,
    TableLike,
    TableUseIndex,
    TableField,
    TableIndex,
    IndexField,
    BrowseDisplay,
    BrowseEnable,
    DataRelation,
    RelationFields,
    ParentIdRelation,
    SourceBufferPhrase,
    KeyFields,
    AggregatePhrase,
    AggregateOption,

    // Statements that assign qualifiers
    AssignStatement,
    AssignEqual,
    BufferCompare,
    BufferCopy,
    CreateStatement,
    DeleteStatement,
    ReleaseStatement,
    ValidateStatement,
    DisplayStatement,
    FormStatement,
    EnableStatement,
    FindStatement,
    OpenQuery,
    RawTransfer,
    SetStatement,
    UpdateStatement,
    PromptForStatement,
    MessageStatement,
    MessageOption,
    SystemDialog,
    RunStatement,
    RunParameter,
    RunSet,
    ParameterTable,
    ParameterTableHandle,
    ParameterDatasetHandle,
    ParameterBuffer,

    // Phrases
    RecordPhrase,
    FieldsPhrase,
    ExceptPhrase,
    UsingPhrase,
    FormItem,

    // Expressions and references
    Expression,
    MemoryManagementFunction,
    RecordFunction,
    WidgetAttribute,
    WidgetName,
    Field,
    Record,

    // Terminals
    Identifier,
    TypeName,
    Literal,
    Datatype(DataType),
    Keyword(Keyword),
}

impl NodeKind {
    /// Kinds whose handler reads the context qualifier assigned by the parent.
    pub const fn consumes_qualifier(self) -> bool {
        matches!(
            self,
            Self::Field
                | Self::Record
                | Self::Expression
                | Self::WidgetAttribute
                | Self::FormItem
                | Self::RecordPhrase
                | Self::MemoryManagementFunction
        )
    }

}

/// Kinds of generic widget-like symbols created by DEFINE statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WidgetKind {
    Button,
    Image,
    Menu,
    SubMenu,
    Rectangle,
    Query,
    Stream,
    Dataset,
    DataSource,
    Frame,
    Browse,
}

impl WidgetKind {
    /// Widgets that live inside a frame and can therefore be named in a field position.
    pub const fn is_field_level(self) -> bool {
        matches!(self, Self::Button | Self::Image | Self::Rectangle | Self::Browse)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Button => "BUTTON",
            Self::Image => "IMAGE",
            Self::Menu => "MENU",
            Self::SubMenu => "SUB-MENU",
            Self::Rectangle => "RECTANGLE",
            Self::Query => "QUERY",
            Self::Stream => "STREAM",
            Self::Dataset => "DATASET",
            Self::DataSource => "DATA-SOURCE",
            Self::Frame => "FRAME",
            Self::Browse => "BROWSE",
        };
        f.write_str(text)
    }
}

/// Keyword terminals that change the meaning of their parent construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Forwards,
    Input,
    Output,
    InputOutput,
    Return,
    Unique,
    Primary,
    Word,
    Frame,
    Browse,
    Buffer,
    Field,
    ThisObject,
    Set,
    Update,
    Get,
    TempTable,
    Class,
}

impl Keyword {
    pub const fn text(self) -> &'static str {
        match self {
            Self::Forwards => "FORWARD",
            Self::Input => "INPUT",
            Self::Output => "OUTPUT",
            Self::InputOutput => "INPUT-OUTPUT",
            Self::Return => "RETURN",
            Self::Unique => "UNIQUE",
            Self::Primary => "PRIMARY",
            Self::Word => "WORD-INDEX",
            Self::Frame => "FRAME",
            Self::Browse => "BROWSE",
            Self::Buffer => "BUFFER",
            Self::Field => "FIELD",
            Self::ThisObject => "THIS-OBJECT",
            Self::Set => "SET",
            Self::Update => "UPDATE",
            Self::Get => "GET",
            Self::TempTable => "TEMP-TABLE",
            Self::Class => "CLASS",
        }
    }
}

/// ABL data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum DataType {
    Character,
    Integer,
    Int64,
    Decimal,
    Logical,
    Date,
    DateTime,
    DateTimeTz,
    Handle,
    WidgetHandle,
    ComHandle,
    Rowid,
    Recid,
    Raw,
    Memptr,
    Longchar,
    Clob,
    Blob,
    /// An object reference; the class name is kept on the symbol
    Class,
    Void,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDataType(pub String);

impl fmt::Display for UnknownDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown data type '{}'", self.0)
    }
}

impl std::error::Error for UnknownDataType {}

/// Matches `word` against `keyword`, accepting any abbreviation at least `min` long.
fn is_abbreviation(word: &str, keyword: &str, min: usize) -> bool {
    word.len() >= min
        && word.len() <= keyword.len()
        && keyword.as_bytes()[..word.len()].eq_ignore_ascii_case(word.as_bytes())
}

impl DataType {
    /// Parse a data-type keyword as written in source, including the abbreviations the
    /// ABL compiler accepts (`CHAR`, `INT`, `DEC`, `LOG`, ...).
    pub fn from_keyword(word: &str) -> Option<Self> {
        const ABBREVIATED: &[(&str, usize, DataType)] = &[
            ("CHARACTER", 4, DataType::Character),
            ("INTEGER", 3, DataType::Integer),
            ("DECIMAL", 3, DataType::Decimal),
            ("LOGICAL", 3, DataType::Logical),
            ("WIDGET-HANDLE", 8, DataType::WidgetHandle),
        ];
        const EXACT: &[(&str, DataType)] = &[
            ("INT64", DataType::Int64),
            ("DATE", DataType::Date),
            ("DATETIME", DataType::DateTime),
            ("DATETIME-TZ", DataType::DateTimeTz),
            ("HANDLE", DataType::Handle),
            ("COM-HANDLE", DataType::ComHandle),
            ("ROWID", DataType::Rowid),
            ("RECID", DataType::Recid),
            ("RAW", DataType::Raw),
            ("MEMPTR", DataType::Memptr),
            ("LONGCHAR", DataType::Longchar),
            ("CLOB", DataType::Clob),
            ("BLOB", DataType::Blob),
            ("CLASS", DataType::Class),
            ("VOID", DataType::Void),
        ];
        EXACT
            .iter()
            .find(|(keyword, _)| keyword.eq_ignore_ascii_case(word))
            .map(|(_, data_type)| *data_type)
            .or_else(|| {
                ABBREVIATED
                    .iter()
                    .find(|(keyword, min, _)| is_abbreviation(word, keyword, *min))
                    .map(|(_, _, data_type)| *data_type)
            })
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Character => "CHARACTER",
            Self::Integer => "INTEGER",
            Self::Int64 => "INT64",
            Self::Decimal => "DECIMAL",
            Self::Logical => "LOGICAL",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
            Self::DateTimeTz => "DATETIME-TZ",
            Self::Handle => "HANDLE",
            Self::WidgetHandle => "WIDGET-HANDLE",
            Self::ComHandle => "COM-HANDLE",
            Self::Rowid => "ROWID",
            Self::Recid => "RECID",
            Self::Raw => "RAW",
            Self::Memptr => "MEMPTR",
            Self::Longchar => "LONGCHAR",
            Self::Clob => "CLOB",
            Self::Blob => "BLOB",
            Self::Class => "CLASS",
            Self::Void => "VOID",
        }
    }
}

impl TryFrom<String> for DataType {
    type Error = UnknownDataType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_keyword(&value).ok_or(UnknownDataType(value))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
