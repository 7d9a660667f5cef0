use crabpeer::media::StreamMetadata;
use crabpeer::webrtc::simulcast;
use crabpeer::{IceCandidate, PeerMode, PeerOptions, PlatformInfo};
use std::env;
use std::fs;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    crabpeer::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: crabpeer-cli <command> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "simulcast" => cmd_simulcast(&args),
        "options" => cmd_options(&args),
        "candidate" => cmd_candidate(&args),
        "browser" => cmd_browser(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn cmd_simulcast(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if args.len() < 5 {
        eprintln!("Usage: crabpeer-cli simulcast <sdp_file> <stream_id> <track_id>");
        std::process::exit(1);
    }
    let sdp = fs::read_to_string(&args[2])?;
    let meta = StreamMetadata {
        stream_id: args[3].clone(),
        video_track_id: Some(args[4].clone()),
    };
    print!("{}", simulcast::add_simulcast(&sdp, &meta));
    Ok(())
}

fn cmd_options(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    // options [path] [--mode <recvonly|sendonly|sendrecv>] [--json]
    let mut path = None;
    let mut mode = PeerMode::Sendrecv;
    let mut json = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" => {
                i += 1;
                mode = match args.get(i).map(String::as_str) {
                    Some("recvonly") => PeerMode::Recvonly,
                    Some("sendonly") => PeerMode::Sendonly,
                    Some("sendrecv") => PeerMode::Sendrecv,
                    other => return Err(format!("invalid mode: {:?}", other).into()),
                };
            }
            "--json" => json = true,
            other => path = Some(other.to_string()),
        }
        i += 1;
    }

    let mut options = PeerOptions::load_layered(path.as_deref().map(Path::new))?;
    options.validate(mode)?;
    options.configuration = options.effective_configuration();

    if json {
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        println!("{}", toml::to_string_pretty(&options)?);
    }
    Ok(())
}

fn cmd_candidate(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if args.len() < 3 {
        eprintln!("Usage: crabpeer-cli candidate '<json>'");
        std::process::exit(1);
    }
    let candidate = IceCandidate::from_json(&args[2])?;
    println!("candidate: {}", candidate.candidate);
    println!("sdpMid: {}", candidate.sdp_mid.as_deref().unwrap_or("-"));
    match candidate.sdp_mline_index {
        Some(index) => println!("sdpMLineIndex: {}", index),
        None => println!("sdpMLineIndex: -"),
    }
    Ok(())
}

fn cmd_browser(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    if args.len() < 3 {
        eprintln!("Usage: crabpeer-cli browser '<user agent>'");
        std::process::exit(1);
    }
    let platform = PlatformInfo::from_user_agent(&args[2..].join(" "));
    println!("browser: {}", platform.browser.as_str());
    println!("plan-b: {}", platform.uses_plan_b());
    println!("simulcast: {}", platform.supports_simulcast());
    Ok(())
}
