//! OData Atom feed extraction
//!
//! The user directory answers lookups with an Atom XML document. The user id
//! lives in a namespaced `userId` element under the entry's `properties`
//! node:
//!
//! ```xml
//! <entry>
//!   <content>
//!     <m:properties>
//!       <d:userId>1234567</d:userId>
//!     </m:properties>
//!   </content>
//! </entry>
//! ```
//!
//! Extraction is lookup-by-name against the parsed tree: the first `userId`
//! directly inside any `properties` node wins; a blank value counts as
//! absent.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

const NS_METADATA: Namespace<'static> =
    Namespace(b"http://schemas.microsoft.com/ado/2007/08/dataservices/metadata");
const NS_DATA: Namespace<'static> =
    Namespace(b"http://schemas.microsoft.com/ado/2007/08/dataservices");

/// Extract the first non-blank `properties/userId` value from an Atom feed.
///
/// Returns `Ok(None)` when the element is absent or blank and `Err` when the
/// document cannot be parsed at all.
pub(crate) fn extract_user_id(xml: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut properties_depth = 0usize;
    let mut capturing = false;
    let mut value = String::new();

    loop {
        match reader.read_resolved_event()? {
            (ResolveResult::Bound(ns), Event::Start(e)) => {
                let local = e.local_name();
                if ns == NS_METADATA && local.as_ref() == b"properties" {
                    properties_depth += 1;
                } else if properties_depth > 0 && ns == NS_DATA && local.as_ref() == b"userId" {
                    capturing = true;
                    value.clear();
                }
            }
            (ResolveResult::Bound(ns), Event::Empty(e)) => {
                // a self-closed userId carries no value: first match wins,
                // and it is blank
                if properties_depth > 0 && ns == NS_DATA && e.local_name().as_ref() == b"userId" {
                    return Ok(None);
                }
            }
            (_, Event::Text(text)) if capturing => {
                value.push_str(&text.unescape()?);
            }
            (ResolveResult::Bound(ns), Event::End(e)) => {
                let local = e.local_name();
                if capturing && ns == NS_DATA && local.as_ref() == b"userId" {
                    let trimmed = value.trim();
                    return Ok((!trimmed.is_empty()).then(|| trimmed.to_string()));
                }
                if ns == NS_METADATA && local.as_ref() == b"properties" {
                    properties_depth = properties_depth.saturating_sub(1);
                }
            }
            (_, Event::Eof) => return Ok(None),
            _ => {}
        }
    }
}
