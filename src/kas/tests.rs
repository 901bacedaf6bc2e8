// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

#[cfg(test)]
mod value_tests {
    use crate::common::Error;
    use crate::kas::{parse_reply, parse_xml, DnsRecord, SoapReply, Value, API_NAMESPACE};
    use crate::kas::soap::{fault_envelope, response_envelope};
    use std::collections::BTreeMap;

    const LIST_REPLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/" xmlns:ns1="urn:xmethodsKasApi" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:ns2="http://xml.apache.org/xml-soap" xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/">
<SOAP-ENV:Body>
<ns1:KasApiResponse>
<return xsi:type="ns2:Map">
<item><key xsi:type="xsd:string">Request</key><value xsi:type="ns2:Map">
<item><key xsi:type="xsd:string">KasRequestTime</key><value xsi:type="xsd:int">1700000000</value></item>
<item><key xsi:type="xsd:string">KasRequestType</key><value xsi:type="xsd:string">get_dns_settings</value></item>
</value></item>
<item><key xsi:type="xsd:string">Response</key><value xsi:type="ns2:Map">
<item><key xsi:type="xsd:string">KasFloodDelay</key><value xsi:type="xsd:float">0.5</value></item>
<item><key xsi:type="xsd:string">ReturnString</key><value xsi:type="xsd:string">TRUE</value></item>
<item><key xsi:type="xsd:string">ReturnInfo</key><value SOAP-ENC:arrayType="ns2:Map[2]" xsi:type="SOAP-ENC:Array">
<item xsi:type="ns2:Map">
<item><key xsi:type="xsd:string">record_zone</key><value xsi:type="xsd:string">example.com</value></item>
<item><key xsi:type="xsd:string">record_name</key><value xsi:type="xsd:string">www</value></item>
<item><key xsi:type="xsd:string">record_type</key><value xsi:type="xsd:string">A</value></item>
<item><key xsi:type="xsd:string">record_data</key><value xsi:type="xsd:string">192.0.2.1</value></item>
<item><key xsi:type="xsd:string">record_aux</key><value xsi:type="xsd:int">0</value></item>
<item><key xsi:type="xsd:string">record_id</key><value xsi:type="xsd:string">1001</value></item>
<item><key xsi:type="xsd:string">record_changeable</key><value xsi:type="xsd:string">Y</value></item>
</item>
<item xsi:type="ns2:Map">
<item><key xsi:type="xsd:string">record_zone</key><value xsi:type="xsd:string">example.com</value></item>
<item><key xsi:type="xsd:string">record_name</key><value xsi:type="xsd:string">_acme-challenge.foo</value></item>
<item><key xsi:type="xsd:string">record_type</key><value xsi:type="xsd:string">TXT</value></item>
<item><key xsi:type="xsd:string">record_data</key><value xsi:type="xsd:string">tok&amp;123</value></item>
<item><key xsi:type="xsd:string">record_aux</key><value xsi:type="xsd:int">0</value></item>
<item><key xsi:type="xsd:string">record_id</key><value xsi:type="xsd:int">1002</value></item>
<item><key xsi:type="xsd:string">record_changeable</key><value xsi:nil="true"/></item>
</item>
</value></item>
</value></item>
</return>
</ns1:KasApiResponse>
</SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

    fn decode_reply(xml: &str) -> Value {
        match parse_reply(xml).expect("reply") {
            SoapReply::Return(ret) => Value::decode_pairs(ret.children()).expect("decode"),
            SoapReply::Fault(fault) => panic!("unexpected fault {fault}"),
        }
    }

    #[test]
    fn decode_list_reply() {
        let decoded = decode_reply(LIST_REPLY);
        let request = decoded.get("Request").expect("Request");
        assert_eq!(request.get("KasRequestTime"), Some(&Value::Int(1700000000)));

        let response = decoded.get("Response").expect("Response");
        assert_eq!(response.get("KasFloodDelay"), Some(&Value::Float(0.5)));
        assert_eq!(response.get("ReturnString").and_then(Value::as_str), Some("TRUE"));

        let info = response.get("ReturnInfo").expect("ReturnInfo");
        let entries = info.as_list().expect("list");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].get("record_changeable"), Some(&Value::Null));

        let records = DnsRecord::list_from_value(info).expect("records");
        assert_eq!(records[0].record_id.as_str(), "1001");
        assert_eq!(records[0].record_type, "A");
        assert_eq!(records[1].record_id.as_str(), "1002");
        assert_eq!(records[1].record_name, "_acme-challenge.foo");
        assert_eq!(records[1].record_data, "tok&123");
        assert_eq!(records[1].zone_host, "example.com");
        assert_eq!(records[1].aux, 0);
    }

    #[test]
    fn scalars_decode() {
        let cases = [
            (r#"<v xsi:type="xsd:string"> padded </v>"#, Value::String(" padded ".to_string())),
            (r#"<v xsi:type="xsd:string"/>"#, Value::String(String::new())),
            (r#"<v xsi:type="xsd:int">-42</v>"#, Value::Int(-42)),
            (r#"<v xsi:type="xsd:float">2.25</v>"#, Value::Float(2.25)),
            (r#"<v xsi:nil="true"/>"#, Value::Null),
        ];
        for (xml, expected) in cases {
            let node = parse_xml(xml).expect(xml);
            assert_eq!(Value::decode(&node).expect(xml), expected, "{xml}");
        }
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let node = parse_xml(r#"<v xsi:type="xsd:boolean">true</v>"#).expect("xml");
        match Value::decode(&node) {
            Err(Error::Decode(message)) => assert!(message.contains("xsd:boolean"), "{message}"),
            other => panic!("expected decode error, got {other:?}"),
        }

        let node = parse_xml(r#"<v xsi:type="xsd:int">forty-two</v>"#).expect("xml");
        assert!(matches!(Value::decode(&node), Err(Error::Decode(_))));
    }

    #[test]
    fn untyped_nodes_pass_through() {
        let node = parse_xml(concat!(
            r#"<r xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="SOAP-ENC:Array">"#,
            r#"<item xsi:type="xsd:string">a</item><item>raw</item><item/>"#,
            r#"<item><b id="1">x &amp; y</b></item></r>"#,
        ))
        .expect("xml");
        assert_eq!(
            Value::decode(&node).expect("decode"),
            Value::List(vec![
                Value::String("a".to_string()),
                Value::String("<item>raw</item>".to_string()),
                Value::String("<item/>".to_string()),
                Value::String(r#"<item><b id="1">x &amp; y</b></item>"#.to_string()),
            ])
        );
    }

    #[test]
    fn nested_values_survive_encoding() {
        let mut inner = BTreeMap::new();
        inner.insert("ids".to_string(), Value::List(vec![Value::Int(1), Value::Int(2)]));
        inner.insert("empty".to_string(), Value::List(Vec::new()));
        inner.insert("nothing".to_string(), Value::Null);
        let mut outer = BTreeMap::new();
        outer.insert("name".to_string(), Value::String("<a & b>".to_string()));
        outer.insert("ratio".to_string(), Value::Float(-0.125));
        outer.insert("inner".to_string(), Value::Map(inner));
        outer.insert(
            "rows".to_string(),
            Value::List(vec![Value::Map(BTreeMap::new()), Value::String("x".to_string())]),
        );
        let value = Value::Map(outer);

        let node = parse_xml(&value.to_xml("return")).expect("xml");
        assert_eq!(Value::decode(&node).expect("decode"), value);
    }

    #[test]
    fn envelope_reply_decodes_as_map() {
        let mut response = BTreeMap::new();
        response.insert("ReturnString".to_string(), Value::String("TRUE".to_string()));
        response.insert("ReturnInfo".to_string(), Value::String("4711".to_string()));
        let mut top = BTreeMap::new();
        top.insert("Response".to_string(), Value::Map(response));
        let top = Value::Map(top);

        let xml = response_envelope(API_NAMESPACE, "KasApi", &top.to_xml("return"));
        assert_eq!(decode_reply(&xml), top);
    }

    #[test]
    fn fault_reply() {
        match parse_reply(&fault_envelope("kas_password_incorrect")).expect("reply") {
            SoapReply::Fault(fault) => assert_eq!(fault, "kas_password_incorrect"),
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn malformed_xml_is_a_decode_error() {
        assert!(matches!(parse_xml("<a><b></a>"), Err(Error::Decode(_))));
        assert!(matches!(parse_xml("<a>"), Err(Error::Decode(_))));
        assert!(matches!(parse_xml(""), Err(Error::Decode(_))));
        assert!(matches!(parse_reply("<a/>"), Err(Error::Decode(_))));
    }
}

#[cfg(test)]
mod client_tests {
    use crate::common::{Error, KasCredentials, KasSettings};
    use crate::kas::soap::{fault_envelope, response_envelope};
    use crate::kas::{DnsSettings, KasClient, NewDnsRecord, RecordId, Value, API_NAMESPACE, AUTH_NAMESPACE};
    use std::collections::BTreeMap;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> KasSettings {
        KasSettings {
            auth_url: format!("{}/soap/KasAuth.php", server.uri()),
            api_url: format!("{}/soap/KasApi.php", server.uri()),
            session_lifetime: 600,
            timeout_secs: 5,
        }
    }

    fn credentials() -> KasCredentials {
        KasCredentials {
            username: "w0123456".to_string(),
            password: "hunter2".to_string(),
        }
    }

    fn api_reply(return_string: &str, info: Value) -> String {
        let mut response = BTreeMap::new();
        response.insert("KasFloodDelay".to_string(), Value::Float(0.0));
        response.insert("ReturnString".to_string(), Value::String(return_string.to_string()));
        response.insert("ReturnInfo".to_string(), info);
        let mut top = BTreeMap::new();
        top.insert("Response".to_string(), Value::Map(response));
        response_envelope(API_NAMESPACE, "KasApi", &Value::Map(top).to_xml("return"))
    }

    fn txt_entry(id: i64, name: &str, data: &str) -> Value {
        let mut entry = BTreeMap::new();
        entry.insert("record_id".to_string(), Value::Int(id));
        entry.insert("record_name".to_string(), Value::String(name.to_string()));
        entry.insert("record_type".to_string(), Value::String("TXT".to_string()));
        entry.insert("record_data".to_string(), Value::String(data.to_string()));
        entry.insert("record_zone".to_string(), Value::String("example.com".to_string()));
        entry.insert("record_aux".to_string(), Value::Int(0));
        Value::Map(entry)
    }

    async fn mount_auth(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/soap/KasAuth.php"))
            .and(header("SOAPAction", "urn:xmethodsKasApiAuthentication#KasAuth"))
            .and(body_string_contains("&quot;kas_auth_type&quot;:&quot;plain&quot;"))
            .and(body_string_contains("&quot;session_update_lifetime&quot;:&quot;Y&quot;"))
            .respond_with(ResponseTemplate::new(200).set_body_string(response_envelope(
                AUTH_NAMESPACE,
                "KasAuth",
                &Value::String("session-abc".to_string()).to_xml("return"),
            )))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn authenticate_and_list() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        Mock::given(method("POST"))
            .and(path("/soap/KasApi.php"))
            .and(body_string_contains("&quot;kas_auth_data&quot;:&quot;session-abc&quot;"))
            .and(body_string_contains("&quot;kas_action&quot;:&quot;get_dns_settings&quot;"))
            .and(body_string_contains("&quot;zone_host&quot;:&quot;example.com&quot;"))
            .respond_with(ResponseTemplate::new(200).set_body_string(api_reply(
                "TRUE",
                Value::List(vec![txt_entry(7, "_acme-challenge.foo", "tok123")]),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = KasClient::authenticate(&settings(&server), &credentials())
            .await
            .expect("authenticate");
        assert_eq!(client.credential().session_token.as_str(), "session-abc");
        assert_eq!(client.credential().username, "w0123456");

        let records = client.get_dns_settings("example.com").await.expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_id, RecordId("7".to_string()));
        assert_eq!(records[0].record_data, "tok123");
    }

    #[tokio::test]
    async fn add_and_delete() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        Mock::given(method("POST"))
            .and(path("/soap/KasApi.php"))
            .and(body_string_contains("&quot;kas_action&quot;:&quot;add_dns_settings&quot;"))
            .and(body_string_contains("&quot;zone_host&quot;:&quot;example.com.&quot;"))
            .and(body_string_contains("&quot;record_aux&quot;:&quot;0&quot;"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(api_reply("TRUE", Value::String("4711".to_string()))),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/soap/KasApi.php"))
            .and(body_string_contains("&quot;kas_action&quot;:&quot;delete_dns_settings&quot;"))
            .and(body_string_contains("&quot;record_id&quot;:&quot;4711&quot;"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(api_reply("TRUE", Value::String("TRUE".to_string()))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = KasClient::authenticate(&settings(&server), &credentials())
            .await
            .expect("authenticate");
        let record_id = client
            .add_dns_settings(&NewDnsRecord::txt("example.com", "_acme-challenge.foo", "tok123"))
            .await
            .expect("add");
        assert_eq!(record_id.as_str(), "4711");
        client.delete_dns_settings(&record_id).await.expect("delete");
    }

    #[tokio::test]
    async fn rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/soap/KasAuth.php"))
            .respond_with(ResponseTemplate::new(500).set_body_string(fault_envelope("kas_password_incorrect")))
            .mount(&server)
            .await;

        match KasClient::authenticate(&settings(&server), &credentials()).await {
            Err(Error::Auth(message)) => assert_eq!(message, "kas_password_incorrect"),
            Err(e) => panic!("expected auth error, got {e:?}"),
            Ok(_) => panic!("expected auth error"),
        }
    }

    #[tokio::test]
    async fn failure_status_is_a_remote_call_error() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        Mock::given(method("POST"))
            .and(path("/soap/KasApi.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string(api_reply("FALSE", Value::Null)))
            .mount(&server)
            .await;

        let client = KasClient::authenticate(&settings(&server), &credentials())
            .await
            .expect("authenticate");
        match client.get_dns_settings("example.com").await {
            Err(Error::RemoteCall(message)) => assert!(message.contains("FALSE"), "{message}"),
            other => panic!("expected remote call error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn api_fault_is_a_remote_call_error() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        Mock::given(method("POST"))
            .and(path("/soap/KasApi.php"))
            .respond_with(ResponseTemplate::new(500).set_body_string(fault_envelope("zone_not_found")))
            .mount(&server)
            .await;

        let client = KasClient::authenticate(&settings(&server), &credentials())
            .await
            .expect("authenticate");
        match client.get_dns_settings("example.com").await {
            Err(Error::RemoteCall(message)) => assert!(message.contains("zone_not_found"), "{message}"),
            other => panic!("expected remote call error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_error_without_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        match KasClient::authenticate(&settings(&server), &credentials()).await {
            Err(Error::Http(status, body)) => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "maintenance");
            }
            Err(e) => panic!("expected http error, got {e:?}"),
            Ok(_) => panic!("expected http error"),
        }
    }

    #[test]
    fn flood_delay_is_capped() {
        assert_eq!(KasClient::flood_delay(0.5), Some(Duration::from_millis(500)));
        assert_eq!(KasClient::flood_delay(1e30), Some(KasClient::MAX_FLOOD_DELAY));
        assert_eq!(KasClient::flood_delay(f64::INFINITY), Some(KasClient::MAX_FLOOD_DELAY));
        assert_eq!(KasClient::flood_delay(0.0), None);
        assert_eq!(KasClient::flood_delay(-3.0), None);
        assert_eq!(KasClient::flood_delay(f64::NAN), None);
    }

    #[tokio::test]
    async fn oversized_flood_delay_is_not_fatal() {
        let server = MockServer::start().await;
        mount_auth(&server).await;
        let mut response = BTreeMap::new();
        response.insert("KasFloodDelay".to_string(), Value::Float(1e30));
        response.insert("ReturnString".to_string(), Value::String("TRUE".to_string()));
        response.insert("ReturnInfo".to_string(), Value::List(Vec::new()));
        let mut top = BTreeMap::new();
        top.insert("Response".to_string(), Value::Map(response));
        Mock::given(method("POST"))
            .and(path("/soap/KasApi.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string(response_envelope(
                API_NAMESPACE,
                "KasApi",
                &Value::Map(top).to_xml("return"),
            )))
            .mount(&server)
            .await;

        let client = KasClient::authenticate(&settings(&server), &credentials())
            .await
            .expect("authenticate");
        let records = client.get_dns_settings("example.com").await.expect("list");
        assert!(records.is_empty());
    }
}
