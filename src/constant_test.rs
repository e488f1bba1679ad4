use crate::constant::{
    CAPABILITIES_ALWAYS_DISABLED, CAPABILITIES_ALWAYS_ENABLED, CAPABILITIES_CONFIGURABLE,
    CapabilityFlags, ColumnType,
};

#[test]
fn test_capability_flags_classification() {
    const ALL_FLAGS: u32 = 0xFFFFFFFF;

    let always_enabled = CAPABILITIES_ALWAYS_ENABLED;
    let configurable = CAPABILITIES_CONFIGURABLE;
    let always_disabled = CAPABILITIES_ALWAYS_DISABLED;

    assert!(
        always_enabled.intersection(configurable).is_empty(),
        "ALWAYS_ENABLED and CONFIGURABLE must not overlap"
    );
    assert!(
        always_enabled.intersection(always_disabled).is_empty(),
        "ALWAYS_ENABLED and ALWAYS_DISABLED must not overlap"
    );
    assert!(
        configurable.intersection(always_disabled).is_empty(),
        "CONFIGURABLE and ALWAYS_DISABLED must not overlap"
    );

    let union = always_enabled | configurable | always_disabled;
    assert_eq!(union.bits(), ALL_FLAGS);

    assert!(always_enabled.contains(CapabilityFlags::CLIENT_PROTOCOL_41));
    assert!(always_enabled.contains(CapabilityFlags::CLIENT_PLUGIN_AUTH));
    assert!(always_enabled.contains(CapabilityFlags::CLIENT_DEPRECATE_EOF));
    assert!(always_disabled.contains(CapabilityFlags::CLIENT_SSL));
    assert!(always_disabled.contains(CapabilityFlags::CLIENT_COMPRESS));
}

#[test]
fn test_column_type_from_u8() {
    for ty in [
        ColumnType::MYSQL_TYPE_TINY,
        ColumnType::MYSQL_TYPE_SHORT,
        ColumnType::MYSQL_TYPE_LONG,
        ColumnType::MYSQL_TYPE_LONGLONG,
        ColumnType::MYSQL_TYPE_FLOAT,
        ColumnType::MYSQL_TYPE_DOUBLE,
        ColumnType::MYSQL_TYPE_STRING,
        ColumnType::MYSQL_TYPE_NEWDECIMAL,
        ColumnType::MYSQL_TYPE_GEOMETRY,
    ] {
        assert_eq!(ColumnType::from_u8(ty as u8), Some(ty));
    }
    assert_eq!(ColumnType::from_u8(0x42), None);
}
