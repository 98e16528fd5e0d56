use num_enum::TryFromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum BlockOption {
    Ip = 1,
    DeviceProperties = 2,
    Dhcp = 3,
    Lldp = 4,
    Control = 5,
    DeviceInitiative = 6,
    #[num_enum(alternatives = [0x81..0xfe])]
    ManufacturerSpecific = 0x80,
    All = 255,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum IpSuboption {
    MacAddress = 1,
    IpParameter = 2,
    FullIpSuite = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum DevicePropertiesSuboption {
    DeviceVendor = 1,
    NameOfStation = 2,
    DeviceId = 3,
    DeviceRole = 4,
    DeviceOptions = 5,
    AliasName = 6,
    DeviceInstance = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ControlSuboption {
    Start = 1,
    Stop = 2,
    Signal = 3,
    Response = 4,
    FactoryReset = 5,
    ResetToFactory = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum AllSuboption {
    All = 255,
}
