// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use super::xml::{parse_xml, XmlElement};
use crate::common::Error;
use quick_xml::escape::escape;

/// Namespace of the session creation service.
pub const AUTH_NAMESPACE: &str = "urn:xmethodsKasApiAuthentication";
/// Namespace of the action dispatch service.
pub const API_NAMESPACE: &str = "urn:xmethodsKasApi";

/// Body of a SOAP reply.
#[derive(Debug)]
pub enum SoapReply {
    /// The `return` element of a successful reply.
    Return(XmlElement),
    /// The `faultstring` of a fault.
    Fault(String),
}

/// Wrap the JSON `params` of `method` in an rpc/encoded SOAP request.
pub fn request_envelope(namespace: &str, method: &str, params: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"xmlns:ns1="{namespace}" "#,
            r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/" "#,
            r#"SOAP-ENV:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
            r#"<SOAP-ENV:Body><ns1:{method}><Params xsi:type="xsd:string">{params}</Params></ns1:{method}></SOAP-ENV:Body>"#,
            r#"</SOAP-ENV:Envelope>"#,
        ),
        namespace = namespace,
        method = method,
        params = escape(params),
    )
}

/// Wrap an encoded `return` node in a SOAP reply, as the provider sends it.
#[cfg(test)]
pub fn response_envelope(namespace: &str, method: &str, return_xml: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"xmlns:ns1="{namespace}" xmlns:ns2="http://xml.apache.org/xml-soap" "#,
            r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/">"#,
            r#"<SOAP-ENV:Body><ns1:{method}Response>{return_xml}</ns1:{method}Response></SOAP-ENV:Body>"#,
            r#"</SOAP-ENV:Envelope>"#,
        ),
        namespace = namespace,
        method = method,
        return_xml = return_xml,
    )
}

/// A SOAP fault, as the provider sends it.
#[cfg(test)]
pub fn fault_envelope(fault_string: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">"#,
            r#"<SOAP-ENV:Body><SOAP-ENV:Fault><faultcode>SOAP-ENV:Server</faultcode>"#,
            r#"<faultstring>{}</faultstring></SOAP-ENV:Fault></SOAP-ENV:Body>"#,
            r#"</SOAP-ENV:Envelope>"#,
        ),
        escape(fault_string),
    )
}

/// Parse a SOAP reply and locate its `return` element or fault.
pub fn parse_reply(xml: &str) -> Result<SoapReply, Error> {
    let envelope = parse_xml(xml)?;
    let body = envelope
        .child("Body")
        .ok_or_else(|| Error::Decode(format!("missing SOAP body in <{}>", envelope.name())))?;
    if let Some(fault) = body.child("Fault") {
        let fault_string = fault
            .child("faultstring")
            .map(|f| f.text().trim().to_string())
            .unwrap_or_else(|| "unknown fault".to_string());
        return Ok(SoapReply::Fault(fault_string));
    }
    let wrapper = body
        .children()
        .first()
        .ok_or_else(|| Error::Decode("empty SOAP body".to_string()))?;
    let ret = wrapper
        .children()
        .first()
        .ok_or_else(|| Error::Decode(format!("<{}> has no return", wrapper.name())))?;
    Ok(SoapReply::Return(ret.clone()))
}
