#![allow(dead_code)]

/// A namespaced order document with repeated element names.
pub const ORDER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ord:order xmlns:ord="urn:example:orders" xmlns="urn:example:common" id="4711">
    <ord:customer>ACME</ord:customer>
    <!-- generated by the shop -->
    <ord:items>
        <ord:item sku="A-1" qty="2">
            <ord:price>10.00</ord:price>
        </ord:item>
        <ord:item sku="B-7" qty="1">
            <ord:price>99.90</ord:price>
        </ord:item>
    </ord:items>
    <note>deliver before noon</note>
</ord:order>"#;

/// `ORDER` as a control document: prefixes differ, whitespace differs, the header
/// comment differs and the dynamic parts use variables and placeholders.
pub const ORDER_CONTROL: &str = r#"<o:order xmlns:o="urn:example:orders" xmlns="urn:example:common" id="${orderId}">
    <o:customer>${customer}</o:customer>
    <!-- any comment -->
    <o:items>
        <o:item sku="A-1" qty="@ignore@"><o:price>10.00</o:price></o:item>
        <o:item sku="B-7" qty="1"><o:price>@ignore@</o:price></o:item>
    </o:items>
    <note>  deliver before noon  </note>
</o:order>"#;

pub const NUMBERS: &str = r#"<Numbers>
    <Numbers1><NumberItem><AreaCode>030</AreaCode><Number>111</Number></NumberItem></Numbers1>
    <Numbers2><NumberItem><AreaCode>040</AreaCode><Number>222</Number></NumberItem></Numbers2>
</Numbers>"#;
