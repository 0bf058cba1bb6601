//! Extraction throughput for each of the three supported extractors
//! (§4.2). TypeScript and JavaScript share one extractor, so only one of
//! them is benchmarked here.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use code_graph::indexer;

const TYPESCRIPT_SAMPLE: &str = r#"
export interface Greeter {
    greet(name: string): string;
}

export class EnglishGreeter implements Greeter {
    private prefix: string = "Hello";

    greet(name: string): string {
        return `${this.prefix}, ${name}!`;
    }
}

export function buildGreeter(): Greeter {
    const greeter = new EnglishGreeter();
    return greeter;
}

export function greetAll(names: string[]): string[] {
    const greeter = buildGreeter();
    return names.map((name) => greeter.greet(name));
}
"#;

const PYTHON_SAMPLE: &str = r#"
from dataclasses import dataclass


@dataclass
class Greeter:
    prefix: str = "Hello"

    def greet(self, name):
        return f"{self.prefix}, {name}!"


def build_greeter():
    return Greeter()


def greet_all(names):
    greeter = build_greeter()
    return [greeter.greet(name) for name in names]
"#;

const JAVA_SAMPLE: &str = r#"
package com.example.app;

import org.springframework.web.bind.annotation.GetMapping;
import org.springframework.web.bind.annotation.RequestMapping;
import org.springframework.web.bind.annotation.RestController;

import java.util.List;

@RestController
@RequestMapping("/api/users")
public class UserController {
    private final UserService userService;

    public UserController(UserService userService) {
        this.userService = userService;
    }

    @GetMapping
    public List<User> list() {
        return userService.findAll();
    }
}
"#;

fn bench_extractors(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");

    group.bench_function("typescript", |b| {
        b.iter(|| indexer::extract(black_box("src/greeter.ts"), black_box(TYPESCRIPT_SAMPLE)))
    });

    group.bench_function("python", |b| {
        b.iter(|| indexer::extract(black_box("pkg/greeter.py"), black_box(PYTHON_SAMPLE)))
    });

    group.bench_function("java", |b| {
        b.iter(|| indexer::extract(black_box("UserController.java"), black_box(JAVA_SAMPLE)))
    });

    group.finish();
}

criterion_group!(benches, bench_extractors);
criterion_main!(benches);
