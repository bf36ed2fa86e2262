//! JNI bindings for Android.
//!
//! These functions are called from Kotlin via the JNI bridge. The Kotlin
//! side holds the time model as JSON and asks for cursor indices.

use jni::objects::{JByteArray, JClass, JString};
use jni::sys::{jdouble, jint, jstring};
use jni::JNIEnv;

use crate::timemap::ScoreTimeModel;
use crate::{locate, time_model_from_bytes, time_model_to_json};

/// Build the time model for MusicXML bytes and return it as JSON.
///
/// Called from Kotlin as:
///   external fun timeModel(data: ByteArray, extension: String?): String?
#[no_mangle]
pub extern "system" fn Java_com_scoresync_app_SyncLib_timeModel(
    mut env: JNIEnv,
    _class: JClass,
    data: JByteArray,
    extension: JString,
) -> jstring {
    let bytes = match env.convert_byte_array(&data) {
        Ok(b) => b,
        Err(_) => return std::ptr::null_mut(),
    };

    let ext: Option<String> = if extension.is_null() {
        None
    } else {
        env.get_string(&extension).ok().map(|s| s.into())
    };

    let json = match time_model_from_bytes(&bytes, ext.as_deref()).and_then(|m| time_model_to_json(&m)) {
        Ok(json) => json,
        Err(e) => {
            log::error!("timeModel: {e}");
            return std::ptr::null_mut();
        }
    };

    match env.new_string(&json) {
        Ok(js) => js.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Cursor index for a time, given a time model JSON string.
/// Returns -1 if the JSON cannot be read.
///
/// Called from Kotlin as:
///   external fun locate(modelJson: String, elapsedSeconds: Double): Int
#[no_mangle]
pub extern "system" fn Java_com_scoresync_app_SyncLib_locate(
    mut env: JNIEnv,
    _class: JClass,
    model_json: JString,
    elapsed_seconds: jdouble,
) -> jint {
    let json: String = match env.get_string(&model_json) {
        Ok(s) => s.into(),
        Err(_) => return -1,
    };

    match serde_json::from_str::<ScoreTimeModel>(&json) {
        Ok(model) => locate(&model, elapsed_seconds) as jint,
        Err(e) => {
            log::error!("locate: bad model JSON: {e}");
            -1
        }
    }
}
