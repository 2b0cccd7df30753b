//! MQTT topic filter syntax

mod topic;

pub use topic::{
    is_reserved, Level, MqttTopicValidator, TopicValidator, LEVEL_SEPARATOR,
    MAX_TOPIC_FILTER_LENGTH,
};
