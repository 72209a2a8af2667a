//! Tag and attribute names understood by the generator.

pub const ASSEMBLY: &str = "assembly";
pub const NAME: &str = "name";
pub const MEMBER: &str = "member";

pub const URL: &str = "url";
pub const VERB: &str = "verb";
pub const SUMMARY: &str = "summary";
pub const REMARKS: &str = "remarks";
pub const GROUP: &str = "group";

pub const PARAM: &str = "param";
pub const IN: &str = "in";
pub const CREF: &str = "cref";
pub const SEE: &str = "see";
pub const REQUIRED: &str = "required";
pub const TYPE: &str = "type";

pub const RESPONSE: &str = "response";
pub const CODE: &str = "code";

pub const PATH: &str = "path";
pub const QUERY: &str = "query";
pub const HEADER: &str = "header";
pub const BODY: &str = "body";

pub const PATH_PARAM: &str = "pathParam";
pub const QUERY_PARAM: &str = "queryParam";
pub const REQUEST_TYPE: &str = "requestType";

pub const CONFIGURATION: &str = "configuration";
pub const DOCUMENT: &str = "document";
pub const INFO: &str = "info";
pub const TITLE: &str = "title";
pub const VERSION: &str = "version";
pub const OPERATIONS: &str = "operations";

/// Member name prefix of type documentation (`T:Contracts.Sample`).
pub const TYPE_MEMBER_PREFIX: &str = "T:";
/// Member name prefix of property documentation (`P:Contracts.Sample.Id`).
pub const PROPERTY_MEMBER_PREFIX: &str = "P:";
